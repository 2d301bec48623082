//! Graph nodes wrapping a behavior configuration and runtime state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    common::Vars,
    graph::{
        handle::{Handle, HandleDirection, HandleId, HandlePatch},
        value::IoValue,
    },
    model::{ConditionConfig, HandleConfig, WorkerConfig},
    utils,
};

/// Unique identifier for a worker.
pub type WorkerId = String;

/// Worker type marking a graph's entry point.
pub const REQUEST_WORKER_KIND: &str = "request";

/// Comparison applied by conditional gating between the truthiness of the
/// configured condition value and the truthiness of the incoming condition
/// handle value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConditionOperator {
    #[default]
    Eq,
    Neq,
}

/// A worker-level predicate deciding whether the behavior runs during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerCondition {
    pub operator: ConditionOperator,
    pub value: IoValue,
}

impl WorkerCondition {
    fn from_config(config: ConditionConfig) -> Self {
        Self {
            operator: config.operator,
            value: IoValue::from_json(crate::IoType::Unknown, config.value),
        }
    }

    fn to_config(&self) -> ConditionConfig {
        ConditionConfig {
            operator: self.operator,
            value: self.value.to_json(),
        }
    }
}

/// A graph node with typed input/output handles, parameters and a behavior
/// resolved through the registry by its `kind`.
///
/// Handles live in an id-keyed map, the single source of truth; the name
/// index is derived and rebuilt on mutation, and the insertion-order list
/// makes iteration order an explicit contract.
#[derive(Debug, Clone)]
pub struct Worker {
    id: WorkerId,
    kind: String,
    parameters: Vars,
    position: Option<(f64, f64)>,
    condition: Option<WorkerCondition>,

    handles: HashMap<HandleId, Handle>,
    handle_order: Vec<HandleId>,
    names: HashMap<String, HandleId>,

    /// monotonic timestamp, advances on any mutation
    last_update: i64,
    /// true once this worker has run during the current execution pass
    executed: bool,
    /// scratch values for behavior use
    values: Vars,
}

impl Worker {
    /// Build a worker from its persistence shape. `fallback_id` is the id
    /// key of the owning `workers` map; a fresh `NODE_<ulid>` is generated
    /// when both are absent.
    pub(crate) fn from_config(
        fallback_id: Option<&str>,
        config: WorkerConfig,
    ) -> Self {
        let id = config.id.or_else(|| fallback_id.map(str::to_string)).unwrap_or_else(utils::worker_id);
        let position = match (config.x, config.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        };

        let mut worker = Self {
            id,
            kind: config.kind,
            parameters: config.parameters,
            position,
            condition: config.condition.map(WorkerCondition::from_config),
            handles: HashMap::new(),
            handle_order: Vec::new(),
            names: HashMap::new(),
            last_update: utils::time::time_millis(),
            executed: false,
            values: Vars::new(),
        };

        // deterministic hydration order: sorted by name key
        let mut entries: Vec<(String, HandleConfig)> = config.handles.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, handle_config) in entries {
            worker.insert_handle(Handle::from_config(&key, handle_config));
        }
        worker
    }

    /// Serialize back to the persistence shape, keyed by handle name.
    pub(crate) fn to_config(&self) -> WorkerConfig {
        let mut handles = HashMap::new();
        for handle in self.iter_handles() {
            handles.insert(handle.name.clone(), handle.to_config());
        }
        WorkerConfig {
            id: Some(self.id.clone()),
            kind: self.kind.clone(),
            parameters: self.parameters.clone(),
            handles,
            x: self.position.map(|p| p.0),
            y: self.position.map(|p| p.1),
            condition: self.condition.as_ref().map(WorkerCondition::to_config),
        }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn parameters(&self) -> &Vars {
        &self.parameters
    }

    pub fn condition(&self) -> Option<&WorkerCondition> {
        self.condition.as_ref()
    }

    pub fn set_condition(
        &mut self,
        condition: Option<WorkerCondition>,
    ) {
        self.condition = condition;
        self.touch();
    }

    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    pub fn executed(&self) -> bool {
        self.executed
    }

    /// Scratch values for behavior use; not part of the handle data flow.
    pub fn values(&self) -> &Vars {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Vars {
        self.touch();
        &mut self.values
    }

    /// Add a handle, assigning an id if missing. The stored handle is
    /// returned; callers observe later mutations through the worker.
    pub fn add_handle(
        &mut self,
        config: HandleConfig,
    ) -> &Handle {
        let key = config.name.clone().unwrap_or_default();
        let handle = Handle::from_config(&key, config);
        let id = handle.id.clone();
        self.insert_handle(handle);
        self.touch();
        &self.handles[&id]
    }

    /// Sequential application of [`add_handle`](Self::add_handle).
    pub fn add_handles(
        &mut self,
        configs: Vec<HandleConfig>,
    ) {
        for config in configs {
            self.add_handle(config);
        }
    }

    /// Merge a partial update into an existing handle. An unknown id is a
    /// deliberate no-op, but `last_update` still advances.
    pub fn update_handle(
        &mut self,
        id: &HandleId,
        patch: HandlePatch,
    ) {
        if let Some(handle) = self.handles.get_mut(id) {
            if let Some(name) = patch.name {
                self.names.remove(&handle.name);
                handle.name = name;
            }
            if let Some(direction) = patch.direction {
                handle.direction = direction;
            }
            if let Some(io_type) = patch.io_type {
                handle.io_type = io_type;
            }
            if let Some(is_system) = patch.is_system {
                handle.is_system = is_system;
            }
            if let Some(is_condition) = patch.is_condition {
                handle.is_condition = is_condition;
            }
            if let Some(is_persistent) = patch.is_persistent {
                handle.is_persistent = is_persistent;
            }
            if let Some(value) = patch.value {
                handle.value = value;
            }
            self.names.insert(handle.name.clone(), id.clone());
        }
        self.touch();
    }

    /// Remove a handle from the id map, the order list and the derived name
    /// index. The id map is the single source of truth; the name index never
    /// outlives it.
    pub fn delete_handle(
        &mut self,
        id: &HandleId,
    ) {
        if let Some(handle) = self.handles.remove(id) {
            self.handle_order.retain(|h| h != id);
            if self.names.get(&handle.name) == Some(id) {
                self.names.remove(&handle.name);
            }
        }
        self.touch();
    }

    pub fn handle(
        &self,
        id: &HandleId,
    ) -> Option<&Handle> {
        self.handles.get(id)
    }

    pub fn handle_mut(
        &mut self,
        id: &HandleId,
    ) -> Option<&mut Handle> {
        self.handles.get_mut(id)
    }

    /// Registry-facing lookup by handle name.
    pub fn handle_by_name(
        &self,
        name: &str,
    ) -> Option<&Handle> {
        self.names.get(name).and_then(|id| self.handles.get(id))
    }

    /// All handles in insertion order.
    pub fn iter_handles(&self) -> impl Iterator<Item = &Handle> {
        self.handle_order.iter().filter_map(|id| self.handles.get(id))
    }

    /// All non-system handles, for UI editing surfaces, in insertion order.
    pub fn user_handles(&self) -> Vec<&Handle> {
        self.iter_handles().filter(|h| !h.is_system).collect()
    }

    /// The first condition-flagged input handle, in insertion order.
    pub fn condition_handle(&self) -> Option<&Handle> {
        self.iter_handles().find(|h| h.direction == HandleDirection::Input && h.is_condition)
    }

    /// Whether the gating condition allows the behavior to run.
    ///
    /// With no condition, or no condition-flagged input handle, gating is
    /// skipped and the worker always proceeds. Otherwise the truthiness of
    /// the configured value is compared against the truthiness of the
    /// incoming value using the declared operator.
    pub fn gate_open(&self) -> bool {
        let Some(condition) = &self.condition else {
            return true;
        };
        let Some(handle) = self.condition_handle() else {
            return true;
        };

        let expected = condition.value.is_truthy();
        let incoming = handle.value.is_truthy();
        match condition.operator {
            ConditionOperator::Eq => incoming == expected,
            ConditionOperator::Neq => incoming != expected,
        }
    }

    /// Set a handle's value by id. Returns false when the id is unknown.
    pub fn set_handle_value(
        &mut self,
        id: &HandleId,
        value: IoValue,
    ) -> bool {
        match self.handles.get_mut(id) {
            Some(handle) => {
                handle.value = value;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Set a handle's value by name. Returns the handle id when found.
    pub fn set_handle_value_by_name(
        &mut self,
        name: &str,
        value: IoValue,
    ) -> Option<HandleId> {
        let id = self.names.get(name)?.clone();
        self.set_handle_value(&id, value);
        Some(id)
    }

    /// Advance the mutation timestamp.
    pub(crate) fn touch(&mut self) {
        self.last_update = utils::time::time_millis();
    }

    pub(crate) fn mark_executed(&mut self) {
        self.executed = true;
    }

    pub(crate) fn reset_executed(&mut self) {
        self.executed = false;
    }

    fn insert_handle(
        &mut self,
        handle: Handle,
    ) {
        let id = handle.id.clone();
        self.names.insert(handle.name.clone(), id.clone());
        if self.handles.insert(id.clone(), handle).is_none() {
            self.handle_order.push(id);
        }
    }
}

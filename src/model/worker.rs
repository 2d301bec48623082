use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    common::Vars,
    graph::{ConditionOperator, HandleDirection, IoType},
};

/// Persistence shape of a worker.
///
/// Workers are stored keyed by id in [`AgentModel`](crate::AgentModel);
/// `id` may be omitted, in which case the map key (or a generated
/// `NODE_<ulid>`) is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// registry type string selecting the worker's behavior
    #[serde(rename = "type")]
    pub kind: String,
    /// opaque behavior-specific configuration
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub parameters: Vars,
    /// handles keyed by name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub handles: HashMap<String, HandleConfig>,
    /// layout hint, irrelevant to execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// layout hint, irrelevant to execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// optional gating condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionConfig>,
}

impl WorkerConfig {
    /// Minimal configuration for a worker of the given type with no
    /// declared handles.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }
}

/// Persistence shape of a handle.
///
/// `name` defaults to the key of the owning `handles` map. `value` is only
/// written back for persistent handles; all other handle values are
/// runtime-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub direction: HandleDirection,
    #[serde(rename = "type", default)]
    pub io_type: IoType,
    /// hidden from end-user editing surfaces
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_system: bool,
    /// marks this input as the gating condition input
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_condition: bool,
    /// the handle's value survives serialization
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_persistent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl HandleConfig {
    pub fn input(
        name: impl Into<String>,
        io_type: IoType,
    ) -> Self {
        Self {
            name: Some(name.into()),
            direction: HandleDirection::Input,
            io_type,
            ..Default::default()
        }
    }

    pub fn output(
        name: impl Into<String>,
        io_type: IoType,
    ) -> Self {
        Self {
            name: Some(name.into()),
            direction: HandleDirection::Output,
            io_type,
            ..Default::default()
        }
    }
}

/// Persistence shape of a worker's gating condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionConfig {
    #[serde(default)]
    pub operator: ConditionOperator,
    pub value: serde_json::Value,
}

//! The top-level container owning workers and the edge index between them.
//!
//! Agent state lives behind a shared lock; clones of an [`Agent`] observe
//! the same graph. Graph mutation (adding/removing workers and edges) is
//! assumed to happen outside an in-flight execution pass.

use std::collections::HashMap;

use crate::{
    AgentflowError, Result, ShareLock,
    graph::{
        edge::{Edge, EdgeId},
        handle::HandleId,
        value::IoValue,
        worker::{REQUEST_WORKER_KIND, Worker, WorkerId},
    },
    model::{AgentModel, EdgeConfig, WorkerConfig},
    utils,
};

/// An upstream producer resolved for one of a worker's input handles.
#[derive(Debug, Clone, PartialEq)]
pub struct Producer {
    /// id of the upstream worker
    pub source: WorkerId,
    /// output handle on the upstream worker
    pub source_handle: HandleId,
    /// input handle on the consuming worker
    pub target_handle: HandleId,
}

struct AgentState {
    id: String,
    title: String,
    workers: HashMap<WorkerId, Worker>,
    /// documented iteration order: insertion order of workers
    order: Vec<WorkerId>,
    /// flat edge index in insertion order
    edges: Vec<Edge>,
    /// worker currently running its behavior, for host highlighting
    current: Option<WorkerId>,
}

/// One execution graph: a set of workers plus the edges between their
/// handles.
#[derive(Clone)]
pub struct Agent {
    state: ShareLock<AgentState>,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            state: ShareLock::new(
                AgentState {
                    id: id.into(),
                    title: title.into(),
                    workers: HashMap::new(),
                    order: Vec::new(),
                    edges: Vec::new(),
                    current: None,
                }
                .into(),
            ),
        }
    }

    pub fn id(&self) -> String {
        self.state.read().unwrap().id.clone()
    }

    pub fn title(&self) -> String {
        self.state.read().unwrap().title.clone()
    }

    /// Add a worker from its configuration, generating a `NODE_<ulid>` id
    /// when the config carries none. An existing worker with the same id is
    /// overwritten.
    pub fn add_worker(
        &self,
        config: WorkerConfig,
    ) -> WorkerId {
        let worker = Worker::from_config(None, config);
        let wid = worker.id().clone();

        let mut state = self.state.write().unwrap();
        if state.workers.insert(wid.clone(), worker).is_none() {
            state.order.push(wid.clone());
        }
        wid
    }

    /// Remove a worker. Edges referencing it are left in place and resolved
    /// defensively at traversal time.
    pub fn delete_worker(
        &self,
        wid: &WorkerId,
    ) {
        let mut state = self.state.write().unwrap();
        state.workers.remove(wid);
        state.order.retain(|w| w != wid);
        if state.current.as_ref() == Some(wid) {
            state.current = None;
        }
    }

    /// Add an edge, returning its generated id.
    pub fn add_edge(
        &self,
        config: EdgeConfig,
    ) -> EdgeId {
        let edge = Edge::from_config(&utils::longid(), config);
        let id = edge.id.clone();
        self.state.write().unwrap().edges.push(edge);
        id
    }

    pub fn delete_edge(
        &self,
        id: &EdgeId,
    ) {
        self.state.write().unwrap().edges.retain(|e| e.id != *id);
    }

    /// All worker ids in insertion order.
    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.state.read().unwrap().order.clone()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> Vec<Edge> {
        self.state.read().unwrap().edges.clone()
    }

    /// True iff at least one worker is the graph's entry point (type
    /// `request`). Used by host UIs, not by the driver.
    pub fn has_input(&self) -> bool {
        let state = self.state.read().unwrap();
        state.workers.values().any(|w| w.kind() == REQUEST_WORKER_KIND)
    }

    /// Ids of all `request`-type workers in insertion order; a full pass
    /// typically starts by executing these.
    pub fn request_workers(&self) -> Vec<WorkerId> {
        let state = self.state.read().unwrap();
        state.order.iter().filter(|wid| state.workers.get(*wid).is_some_and(|w| w.kind() == REQUEST_WORKER_KIND)).cloned().collect()
    }

    /// Run a closure against a worker under the read lock.
    pub fn with_worker<R>(
        &self,
        wid: &WorkerId,
        f: impl FnOnce(&Worker) -> R,
    ) -> Option<R> {
        let state = self.state.read().unwrap();
        state.workers.get(wid).map(f)
    }

    /// Run a closure against a worker under the write lock.
    pub fn with_worker_mut<R>(
        &self,
        wid: &WorkerId,
        f: impl FnOnce(&mut Worker) -> R,
    ) -> Option<R> {
        let mut state = self.state.write().unwrap();
        state.workers.get_mut(wid).map(f)
    }

    /// Resolve the upstream producers feeding a worker's input handles,
    /// optionally filtered to one handle, in edge insertion order.
    ///
    /// Edges whose source worker or source handle no longer resolve are
    /// skipped ("no producer"), tolerating partially-edited graphs. When
    /// multiple edges target the same handle, all are returned.
    pub fn producers(
        &self,
        wid: &WorkerId,
        handle: Option<&HandleId>,
    ) -> Vec<Producer> {
        let state = self.state.read().unwrap();
        let Some(worker) = state.workers.get(wid) else {
            return Vec::new();
        };

        state
            .edges
            .iter()
            .filter(|edge| edge.target == *wid && worker.handle(&edge.target_handle).is_some())
            .filter(|edge| handle.is_none_or(|h| edge.target_handle == *h))
            .filter(|edge| {
                state.workers.get(&edge.source).is_some_and(|source| source.handle(&edge.source_handle).is_some())
            })
            .map(|edge| Producer {
                source: edge.source.clone(),
                source_handle: edge.source_handle.clone(),
                target_handle: edge.target_handle.clone(),
            })
            .collect()
    }

    /// The single-producer convenience: first producer for a handle, if any.
    pub fn first_producer(
        &self,
        wid: &WorkerId,
        handle: &HandleId,
    ) -> Option<Producer> {
        self.producers(wid, Some(handle)).into_iter().next()
    }

    /// Copy an upstream output value onto a downstream input handle.
    /// Returns false when either endpoint no longer resolves.
    pub(crate) fn copy_edge_value(
        &self,
        producer: &Producer,
        target: &WorkerId,
    ) -> bool {
        let mut state = self.state.write().unwrap();
        let Some(value) = state.workers.get(&producer.source).and_then(|w| w.handle(&producer.source_handle)).map(|h| h.value.clone()) else {
            return false;
        };
        match state.workers.get_mut(target) {
            Some(worker) => worker.set_handle_value(&producer.target_handle, value),
            None => false,
        }
    }

    /// Reset every worker's memoization flag and clear the currently
    /// executing pointer. Must be called before a new top-level execution
    /// pass; the driver itself never resets.
    pub fn reset_execution_state(&self) {
        let mut state = self.state.write().unwrap();
        for worker in state.workers.values_mut() {
            worker.reset_executed();
        }
        state.current = None;
    }

    /// The worker currently running its behavior, if any.
    pub fn current(&self) -> Option<WorkerId> {
        self.state.read().unwrap().current.clone()
    }

    pub(crate) fn set_current(
        &self,
        wid: Option<WorkerId>,
    ) {
        self.state.write().unwrap().current = wid;
    }

    /// Read a handle value by worker id and handle name.
    pub fn handle_value(
        &self,
        wid: &WorkerId,
        name: &str,
    ) -> Option<IoValue> {
        let state = self.state.read().unwrap();
        state.workers.get(wid).and_then(|w| w.handle_by_name(name)).map(|h| h.value.clone())
    }

    /// Write a handle value by worker id and handle name, returning the
    /// handle id for notification.
    pub(crate) fn set_handle_value_by_name(
        &self,
        wid: &WorkerId,
        name: &str,
        value: IoValue,
    ) -> Result<HandleId> {
        let mut state = self.state.write().unwrap();
        let worker = state.workers.get_mut(wid).ok_or_else(|| AgentflowError::Worker(format!("worker '{}' not found", wid)))?;
        worker
            .set_handle_value_by_name(name, value)
            .ok_or_else(|| AgentflowError::Handle(format!("worker '{}' has no handle named '{}'", wid, name)))
    }

    /// Serialize the graph back to its persistence shape. Runtime handle
    /// values round-trip only for persistent handles.
    pub fn to_model(&self) -> AgentModel {
        let state = self.state.read().unwrap();
        let mut workers = HashMap::new();
        for wid in &state.order {
            if let Some(worker) = state.workers.get(wid) {
                workers.insert(wid.clone(), worker.to_config());
            }
        }
        let mut edges = HashMap::new();
        for edge in &state.edges {
            edges.insert(edge.id.clone(), edge.to_config());
        }
        AgentModel {
            id: state.id.clone(),
            title: state.title.clone(),
            workers,
            edges,
        }
    }
}

impl TryFrom<&AgentModel> for Agent {
    type Error = AgentflowError;

    /// Hydrate a graph from its persistence shape. Map keys are ulids;
    /// iterating them sorted makes insertion order creation order.
    fn try_from(model: &AgentModel) -> Result<Self> {
        let agent = Agent::new(model.id.clone(), model.title.clone());

        let mut worker_keys: Vec<&String> = model.workers.keys().collect();
        worker_keys.sort();
        for key in worker_keys {
            let mut config = model.workers[key].clone();
            config.id.get_or_insert_with(|| key.clone());
            agent.add_worker(config);
        }

        let mut edge_keys: Vec<&String> = model.edges.keys().collect();
        edge_keys.sort();
        {
            let mut state = agent.state.write().unwrap();
            for key in edge_keys {
                state.edges.push(Edge::from_config(key, model.edges[key].clone()));
            }
        }

        Ok(agent)
    }
}

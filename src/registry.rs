//! Worker behavior registry.
//!
//! The execution core never inspects behavior internals; it resolves a
//! worker's `type` string to a [`WorkerBehavior`] and calls it. Behaviors
//! are provided by the host application.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tracing::trace;

use crate::{
    AgentflowError, Result,
    common::Vars,
    graph::{Agent, WorkerId},
    model::WorkerConfig,
    runtime::ExecutionContext,
};

/// Executable behavior backing a worker type.
#[async_trait]
pub trait WorkerBehavior: Send + Sync {
    /// Optional factory configuration used by graph-building tools to
    /// instantiate a pre-wired worker declaring its default handles.
    fn create(&self) -> Option<WorkerConfig> {
        None
    }

    /// Run the behavior for one worker. Inputs are read from the worker's
    /// handle values (fully resolved before this call); outputs are written
    /// back through the context so value-change events fire. May perform
    /// arbitrary I/O.
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        wid: &WorkerId,
        params: &Vars,
    ) -> Result<()>;
}

/// Lookup table mapping worker `type` strings to behaviors.
#[derive(Default)]
pub struct Registry {
    behaviors: HashMap<String, Arc<dyn WorkerBehavior>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a behavior for a worker type. A later registration for the
    /// same type replaces the earlier one.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        behavior: impl WorkerBehavior + 'static,
    ) {
        let kind = kind.into();
        trace!(kind = %kind, "registering worker behavior");
        self.behaviors.insert(kind, Arc::new(behavior));
    }

    /// Resolve a worker type to its behavior.
    pub fn lookup(
        &self,
        kind: &str,
    ) -> Result<Arc<dyn WorkerBehavior>> {
        self.behaviors.get(kind).cloned().ok_or_else(|| AgentflowError::UnregisteredWorkerType(kind.to_string()))
    }

    /// Instantiate a pre-wired worker of the given type into the agent,
    /// using the behavior's factory configuration when it declares one.
    pub fn instantiate(
        &self,
        agent: &Agent,
        kind: &str,
    ) -> Result<WorkerId> {
        let behavior = self.lookup(kind)?;
        let mut config = behavior.create().unwrap_or_else(|| WorkerConfig::of_kind(kind));
        config.kind = kind.to_string();
        Ok(agent.add_worker(config))
    }
}

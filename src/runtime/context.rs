//! Per-agent execution context.
//!
//! The context carries everything one execution pass needs: the owning
//! agent (explicitly, never through ambient globals), the behavior
//! registry, the event queue, the per-pass in-progress set used for cycle
//! detection, and the cancellation coordinator.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use tokio::sync::broadcast;

use crate::{
    Config, Result,
    common::{BroadcastQueue, Shutdown},
    events::ExecutionEvent,
    graph::{Agent, IoValue, WorkerId},
    registry::Registry,
};

pub struct ExecutionContext {
    agent: Agent,
    registry: Arc<Registry>,
    events: Arc<BroadcastQueue<ExecutionEvent>>,
    /// workers currently being resolved in this pass; re-entry means a cycle
    in_progress: Mutex<HashSet<WorkerId>>,
    shutdown: Shutdown,
}

impl ExecutionContext {
    pub fn new(
        agent: Agent,
        registry: Arc<Registry>,
    ) -> Arc<Self> {
        Self::new_with_config(agent, registry, &Config::default())
    }

    pub fn new_with_config(
        agent: Agent,
        registry: Arc<Registry>,
        config: &Config,
    ) -> Arc<Self> {
        Arc::new(Self {
            agent,
            registry,
            events: BroadcastQueue::new(config.event_queue_capacity),
            in_progress: Mutex::new(HashSet::new()),
            shutdown: Shutdown::new(),
        })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Subscribe to execution events. Subscribers only receive events sent
    /// after subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    /// Abort the in-flight pass; the driver returns `Canceled` before the
    /// next worker starts. A canceled context stays canceled; start a fresh
    /// context for the next pass.
    pub fn cancel(&self) {
        self.shutdown.shutdown();
    }

    pub fn is_canceled(&self) -> bool {
        self.shutdown.is_terminated()
    }

    /// Wait until the pass is canceled.
    pub async fn wait_canceled(&self) {
        self.shutdown.wait().await;
    }

    /// Prepare the context and agent for a new top-level pass: clears every
    /// worker's memoization flag, the current pointer, and the in-progress
    /// set left behind by an errored pass.
    pub fn reset(&self) {
        self.agent.reset_execution_state();
        self.in_progress.lock().unwrap().clear();
    }

    /// Read a handle value on any worker by name.
    pub fn handle_value(
        &self,
        wid: &WorkerId,
        name: &str,
    ) -> Option<IoValue> {
        self.agent.handle_value(wid, name)
    }

    /// Write a handle value by name and notify subscribers.
    pub fn set_handle_value(
        &self,
        wid: &WorkerId,
        name: &str,
        value: IoValue,
    ) -> Result<()> {
        let handle = self.agent.set_handle_value_by_name(wid, name, value)?;
        self.emit(ExecutionEvent::HandleValueChanged {
            worker: wid.clone(),
            handle,
        });
        Ok(())
    }

    pub(crate) fn emit(
        &self,
        event: ExecutionEvent,
    ) {
        let _ = self.events.send(event);
    }

    /// Update the agent's currently-executing pointer and notify.
    pub(crate) fn set_current(
        &self,
        wid: Option<WorkerId>,
    ) {
        self.agent.set_current(wid.clone());
        self.emit(ExecutionEvent::CurrentWorkerChanged(wid));
    }

    /// Mark a worker as being resolved. Returns false on re-entry, which
    /// means the graph is cyclic.
    pub(crate) fn enter(
        &self,
        wid: &WorkerId,
    ) -> bool {
        self.in_progress.lock().unwrap().insert(wid.clone())
    }

    pub(crate) fn leave(
        &self,
        wid: &WorkerId,
    ) {
        self.in_progress.lock().unwrap().remove(wid);
    }
}

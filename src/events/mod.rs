//! Execution events for host observation.
//!
//! Events are broadcast during an execution pass so that hosts can
//! highlight active workers and refresh displayed handle values without
//! polling the graph.

use crate::graph::{HandleId, WorkerId};

/// Event emitted on the execution event queue.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    /// The currently-executing worker pointer changed.
    CurrentWorkerChanged(Option<WorkerId>),
    /// A worker's behavior is about to run (inputs resolved, gate open).
    WorkerStarted(WorkerId),
    /// A worker's behavior returned successfully.
    WorkerFinished(WorkerId),
    /// A worker's gating condition was unmet; its behavior did not run.
    WorkerSkipped(WorkerId),
    /// A handle's value changed, either by edge propagation or through a
    /// behavior writing its outputs.
    HandleValueChanged {
        worker: WorkerId,
        handle: HandleId,
    },
}

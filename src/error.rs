//! Error types for Agentflow.
//!
//! All errors in Agentflow are represented by the `AgentflowError` enum,
//! which provides specific variants for different error categories.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Agentflow operations.
///
/// Each variant represents a specific category of error that can occur
/// during graph definition, hydration, or execution.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum AgentflowError {
    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Agent-level graph errors.
    #[error("{0}")]
    Agent(String),

    /// Worker definition or lookup errors.
    #[error("{0}")]
    Worker(String),

    /// Handle definition or lookup errors.
    #[error("{0}")]
    Handle(String),

    /// A worker's `type` has no behavior registered for it.
    #[error("no behavior registered for worker type '{0}'")]
    UnregisteredWorkerType(String),

    /// The graph contains a cycle reachable from the executed worker.
    #[error("cycle detected while resolving worker '{0}'")]
    CyclicGraph(String),

    /// A registry behavior failed during execution.
    #[error("{0}")]
    Execution(String),

    /// The execution pass was canceled through its shutdown coordinator.
    #[error("execution pass canceled")]
    Canceled,

    /// Event queue errors.
    #[error("{0}")]
    Queue(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<AgentflowError> for String {
    fn from(val: AgentflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for AgentflowError {
    fn from(error: std::io::Error) -> Self {
        AgentflowError::IoError(error.to_string())
    }
}

impl From<AgentflowError> for std::io::Error {
    fn from(val: AgentflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for AgentflowError {
    fn from(error: serde_json::Error) -> Self {
        AgentflowError::Convert(error.to_string())
    }
}

//! # Agentflow
//!
//! Agentflow is a lightweight dataflow execution graph written in Rust.
//! It is designed to be embedded in applications that orchestrate typed
//! "workers" (nodes) wired by edges between named input/output handles.
//!
//! ## Core Features
//!
//! - **Pull-Based Execution**: requesting any worker transitively resolves
//!   and executes its upstream subgraph before the worker itself runs
//! - **Per-Pass Memoization**: within one execution pass every worker runs
//!   at most once, no matter how often it is referenced upstream
//! - **Conditional Gating**: a worker may carry a condition that decides,
//!   from one input handle's value, whether its behavior runs
//! - **Cycle Detection**: cyclic graphs fail fast with a typed error
//!   instead of exhausting the stack
//! - **Event Stream**: hosts subscribe to execution events (current worker
//!   changes, handle value changes) without any UI framework coupling
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agentflow::{Agent, AgentModel, ExecutionContext, Registry, Vars, runtime};
//!
//! let model = AgentModel::from_json(json_str)?;
//! let agent = Agent::try_from(&model)?;
//!
//! let mut registry = Registry::new();
//! registry.register("request", my_request_behavior);
//!
//! let ctx = ExecutionContext::new(agent.clone(), registry.into());
//! agent.reset_execution_state();
//! runtime::execute(&ctx, &worker_id, &Vars::new()).await?;
//! ```

mod common;
mod config;
mod error;
mod events;
mod graph;
mod model;
mod registry;
pub mod runtime;
mod utils;

use std::sync::{Arc, RwLock};

pub use common::Vars;
pub use config::Config;
pub use error::AgentflowError;
pub use events::ExecutionEvent;
pub use graph::*;
pub use model::*;
pub use registry::{Registry, WorkerBehavior};
pub use runtime::ExecutionContext;

/// Result type alias for Agentflow operations.
pub type Result<T> = std::result::Result<T, AgentflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;

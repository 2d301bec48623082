mod agent;
mod edge;
mod worker;

pub use agent::AgentModel;
pub use edge::EdgeConfig;
pub use worker::{ConditionConfig, HandleConfig, WorkerConfig};

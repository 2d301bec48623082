pub mod agent;
pub mod edge;
pub mod handle;
pub mod value;
pub mod worker;

pub use agent::{Agent, Producer};
pub use edge::{Edge, EdgeId};
pub use handle::{Handle, HandleDirection, HandleId, HandlePatch};
pub use value::{IoType, IoValue};
pub use worker::{ConditionOperator, REQUEST_WORKER_KIND, Worker, WorkerCondition, WorkerId};

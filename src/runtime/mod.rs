mod context;
mod driver;

pub use context::ExecutionContext;
pub use driver::execute;

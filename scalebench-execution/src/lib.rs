//! scalebench execution engine
//!
//! The paced batch executor fans work items out to a fixed pool of
//! workers, admitting a bounded number per tick. It drives workload
//! generation, cleanup and batch measurement. The process module runs
//! external load tools as scoped subprocesses.

pub mod batch;
pub mod error;
pub mod executor;
pub mod process;

// Re-export main types
pub use batch::{BatchHandler, BatchJob, BatchReport, ItemFailure};
pub use error::{ExecutionError, ExecutionResult};
pub use executor::{clean, run_batch, run_unpaced};
pub use process::{ExternalTool, LoadTool, ToolInvocation};
pub use scalebench_config::FailurePolicy;

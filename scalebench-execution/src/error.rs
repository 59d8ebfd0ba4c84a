//! Error types for batch execution and external tools

use thiserror::Error;

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// An item failed under the fail-fast policy
    #[error("Item {index} failed: {source:#}")]
    ItemFailed {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("All workers exited after {processed} of {total} items")]
    WorkersExited { processed: usize, total: usize },

    #[error("Unsupported load tool: {0}")]
    UnsupportedTool(String),

    #[error("Failed to prepare script for {tool}: {source}")]
    Script {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
}

impl ExecutionError {
    /// Whether this is a configuration problem rather than a runtime failure
    pub fn is_configuration(&self) -> bool {
        matches!(self, ExecutionError::UnsupportedTool(_))
    }
}

/// Result type for execution operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;

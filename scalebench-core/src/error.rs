//! Core error types for scalebench

use thiserror::Error;

/// Errors raised while building core domain values
#[derive(Debug, Error)]
pub enum CoreError {
    /// A workload reference string was not of the form `namespace/name`
    #[error("Invalid workload reference '{0}', expected <namespace>/<name>")]
    InvalidWorkloadRef(String),

    /// A workload URL could not be used as an endpoint
    #[error("Invalid workload URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

//! Probe error types

use scalebench_resilience::Retryable;
use std::time::Duration;

/// Error type for probe operations
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Invalid host header: {0:?}")]
    InvalidHostHeader(String),

    #[error("Request to {address} failed: {source}")]
    Transport {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("No answer from {endpoint} after {attempts} attempts: {last_error}")]
    Exhausted {
        endpoint: String,
        attempts: u32,
        last_error: String,
    },

    #[error("No answer from {endpoint} within {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },
}

impl Retryable for ProbeError {
    fn is_retryable(&self) -> bool {
        matches!(self, ProbeError::Transport { .. })
    }
}

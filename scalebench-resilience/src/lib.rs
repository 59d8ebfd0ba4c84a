//! Resilience patterns for scalebench
//!
//! Bounded retry at a fixed interval. The cold-start probe retries
//! transport errors this way until the workload answers.

pub mod retry;

// Re-export commonly used types
pub use retry::{RetryError, RetryExecutor, RetryPolicy, Retryable};

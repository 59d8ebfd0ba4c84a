//! Core domain types for scalebench
//!
//! This crate contains the vocabulary shared by the batch executor, the
//! cluster seam and the measurement pipeline. It has minimal dependencies
//! and no I/O.

pub mod endpoint;
pub mod error;
pub mod result;
pub mod workload;

// Re-export commonly used types at the crate root
pub use endpoint::EndpointDescriptor;
pub use error::{CoreError, Result};
pub use result::{PodResult, ReplicaResult, SessionResult};
pub use workload::{numeric_suffix, sort_by_numeric_suffix, WorkloadRef};

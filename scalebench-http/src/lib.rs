//! HTTP probing for scalebench
//!
//! Two ways of putting traffic on a freshly resolved workload endpoint:
//! a single retrying request that detects the end of a cold start, and a
//! fixed-rate generator that sustains load for a wall-clock duration. Both
//! dial the resolved address directly and present the workload's host
//! header so no DNS is needed.

pub mod client;
pub mod config;
pub mod errors;
pub mod load;
pub mod probe;

// Re-export main types for convenience
pub use client::{build_client, send_request};
pub use config::{ColdStartSettings, LoadSettings};
pub use errors::ProbeError;
pub use load::{LoadGenerator, LoadReport};
pub use probe::{ColdStartProbe, ProbeAnswer};

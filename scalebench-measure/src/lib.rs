//! Measurement pipeline for scalebench
//!
//! A [`MeasurementSession`] measures one workload: it watches the backing
//! deployment while a probe drives traffic at the resolved endpoint, builds
//! the ready-replica curve from the watch, and collects per-pod readiness
//! once the probe is done and a settling delay has passed.
//!
//! The [`runner`] runs many sessions through the batch executor and merges
//! their outcomes in an [`Aggregator`]. The [`fleet`] module creates and
//! removes the workloads being measured.

pub mod aggregate;
pub mod collector;
pub mod error;
pub mod fleet;
pub mod probe;
pub mod replica;
pub mod report;
pub mod runner;
pub mod session;

// Re-export main types
pub use aggregate::{Aggregator, MeasurementFailure, MeasurementReport};
pub use collector::PodReadinessCollector;
pub use error::{DriverError, MeasureError, MeasureResult};
pub use fleet::{
    clean_workloads, delete_namespaces, discover_workloads, ensure_namespaces, wait_until_ready, CleanReport,
    GenerateHandler,
};
pub use probe::{ProbeDriver, ProbeOutcome, ProbeStrategy};
pub use replica::ReplicaCurveBuilder;
pub use runner::{measure_all, MeasureSettings};
pub use session::{MeasurementSession, SessionConfig, SessionState};

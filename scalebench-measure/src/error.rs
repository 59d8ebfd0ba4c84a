//! Measurement error types

use scalebench_cluster::ClusterError;
use scalebench_core::{EndpointDescriptor, WorkloadRef};
use scalebench_execution::ExecutionError;
use scalebench_http::ProbeError;
use std::time::Duration;
use thiserror::Error;

/// Failure of a probe strategy
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Http(#[from] ProbeError),

    #[error(transparent)]
    Tool(#[from] ExecutionError),
}

impl DriverError {
    /// Configuration problems such as an unsupported tool name
    pub fn is_configuration(&self) -> bool {
        matches!(self, DriverError::Tool(e) if e.is_configuration())
    }
}

/// Errors that end a measurement session or a fleet operation
#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("Probe setup for {workload} failed: {source}")]
    Setup {
        workload: WorkloadRef,
        #[source]
        source: DriverError,
    },

    #[error("Watch for {workload} failed: {source}")]
    Watch {
        workload: WorkloadRef,
        #[source]
        source: ClusterError,
    },

    #[error("Lookup of {workload} failed: {source}")]
    Lookup {
        workload: WorkloadRef,
        #[source]
        source: ClusterError,
    },

    #[error("Cannot resolve endpoint for {workload}: {source}")]
    Resolve {
        workload: WorkloadRef,
        #[source]
        source: ClusterError,
    },

    #[error("Probe of {workload} at {endpoint} failed: {source}")]
    Probe {
        workload: WorkloadRef,
        endpoint: EndpointDescriptor,
        #[source]
        source: DriverError,
    },

    #[error("Pod collection for {workload} failed: {source}")]
    Collect {
        workload: WorkloadRef,
        #[source]
        source: ClusterError,
    },

    #[error("{workload} not ready after {timeout:?}")]
    NotReady { workload: WorkloadRef, timeout: Duration },

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Result type for measurement operations
pub type MeasureResult<T> = Result<T, MeasureError>;

//! Cluster error types

use scalebench_core::CoreError;

/// Errors from cluster access and endpoint resolution
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error("Watch on {target} failed: {message}")]
    Watch { target: String, message: String },

    /// A resource the lookup depends on is structurally absent
    #[error("{detail}")]
    MissingResource { resource: &'static str, detail: String },

    #[error("Ingress service {service} has {count} load balancer entries, expected exactly one")]
    AmbiguousIngress { service: String, count: usize },

    #[error("Malformed {kind} {name}: {reason}")]
    Malformed {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ClusterError {
    pub fn missing(resource: &'static str, detail: impl Into<String>) -> Self {
        ClusterError::MissingResource {
            resource,
            detail: detail.into(),
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ClusterError::Api(_) | ClusterError::Watch { .. })
    }
}

/// Result type for cluster operations
pub type ClusterResult<T> = Result<T, ClusterError>;

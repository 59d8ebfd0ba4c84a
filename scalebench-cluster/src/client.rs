//! The cluster API surface scalebench consumes

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Service};
use scalebench_core::WorkloadRef;

use crate::error::ClusterResult;
use crate::watch::DeploymentWatch;

/// Label that ties deployments and pods to their serving workload
pub const WORKLOAD_LABEL: &str = "serving.knative.dev/service";

/// Label selector matching everything that backs a workload
pub fn workload_selector(name: &str) -> String {
    format!("{}={}", WORKLOAD_LABEL, name)
}

/// A serving workload as reported by the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub namespace: String,
    pub name: String,
    /// Externally reported URL, once the platform has assigned one
    pub url: Option<String>,
    pub ready: bool,
}

impl Workload {
    pub fn workload_ref(&self) -> WorkloadRef {
        WorkloadRef::new(self.namespace.clone(), self.name.clone())
    }
}

/// What to create for one workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub namespace: String,
    pub name: String,
    pub image: String,
    pub min_scale: Option<u32>,
    pub max_scale: Option<u32>,
}

/// Cluster operations used by generation, cleanup and measurement
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn get_workload(&self, namespace: &str, name: &str) -> ClusterResult<Workload>;

    async fn list_workloads(&self, namespace: &str) -> ClusterResult<Vec<Workload>>;

    async fn create_workload(&self, spec: &WorkloadSpec) -> ClusterResult<Workload>;

    async fn delete_workload(&self, namespace: &str, name: &str) -> ClusterResult<()>;

    async fn list_namespaces(&self) -> ClusterResult<Vec<String>>;

    async fn create_namespace(&self, name: &str) -> ClusterResult<()>;

    async fn delete_namespace(&self, name: &str) -> ClusterResult<()>;

    async fn get_service(&self, namespace: &str, name: &str) -> ClusterResult<Service>;

    async fn list_pods(&self, namespace: &str, selector: &str) -> ClusterResult<Vec<Pod>>;

    /// Open a watch on deployments matching `selector`.
    ///
    /// The returned handle owns the subscription; stopping or dropping it
    /// releases the connection.
    async fn watch_deployments(&self, namespace: &str, selector: &str) -> ClusterResult<DeploymentWatch>;
}

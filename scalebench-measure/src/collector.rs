//! Point-in-time pod readiness

use k8s_openapi::api::core::v1::Pod;
use scalebench_cluster::{workload_selector, ClusterClient, ClusterResult};
use scalebench_core::PodResult;
use std::sync::Arc;
use tracing::warn;

/// Lists a workload's pods once and computes creation-to-ready durations
#[derive(Clone)]
pub struct PodReadinessCollector {
    cluster: Arc<dyn ClusterClient>,
}

impl PodReadinessCollector {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }

    /// Pods without a Ready condition are skipped with a warning
    pub async fn collect(&self, namespace: &str, workload: &str) -> ClusterResult<Vec<PodResult>> {
        let pods = self
            .cluster
            .list_pods(namespace, &workload_selector(workload))
            .await?;

        let results = pods
            .iter()
            .filter_map(|pod| {
                let result = pod_result(pod);
                if result.is_none() {
                    warn!(
                        namespace,
                        workload,
                        pod = pod.metadata.name.as_deref().unwrap_or("<unnamed>"),
                        "Pod has no Ready condition, skipping"
                    );
                }
                result
            })
            .collect();

        Ok(results)
    }
}

/// Timing of one pod, if it has a creation time and a true Ready condition
pub fn pod_result(pod: &Pod) -> Option<PodResult> {
    let name = pod.metadata.name.clone()?;
    let created_at = pod.metadata.creation_timestamp.as_ref()?.0;
    let ready_at = pod
        .status
        .as_ref()?
        .conditions
        .as_ref()?
        .iter()
        .find(|c| c.type_ == "Ready" && c.status == "True")?
        .last_transition_time
        .as_ref()?
        .0;

    Some(PodResult::new(name, created_at, ready_at))
}

//! Workload fleet creation and removal

use anyhow::Context;
use async_trait::async_trait;
use scalebench_cluster::{ClusterClient, ClusterResult, WorkloadSpec};
use scalebench_config::{ClusterConfig, GenerateConfig};
use scalebench_core::{sort_by_numeric_suffix, WorkloadRef};
use scalebench_execution::{clean, BatchHandler};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{MeasureError, MeasureResult};

#[derive(Debug, Clone, Copy)]
struct ReadyWait {
    timeout: Duration,
    check_interval: Duration,
}

/// Creates workload `{prefix}-{index}` for every batch index.
///
/// Workloads are spread round-robin over the target namespaces. With
/// `wait_ready` set an item only completes once the workload reports Ready.
pub struct GenerateHandler {
    cluster: Arc<dyn ClusterClient>,
    namespaces: Vec<String>,
    prefix: String,
    image: String,
    min_scale: Option<u32>,
    max_scale: Option<u32>,
    wait: Option<ReadyWait>,
}

impl GenerateHandler {
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        namespaces: Vec<String>,
        cluster_config: &ClusterConfig,
        config: &GenerateConfig,
    ) -> Self {
        Self {
            cluster,
            namespaces,
            prefix: cluster_config.service_prefix.clone(),
            image: config.image.clone(),
            min_scale: Some(config.min_scale),
            max_scale: (config.max_scale > 0).then_some(config.max_scale),
            wait: config.wait_ready.then_some(ReadyWait {
                timeout: config.ready_timeout,
                check_interval: config.check_interval,
            }),
        }
    }

    /// Workload reference for a batch index
    pub fn workload_for(&self, index: usize) -> Option<WorkloadRef> {
        if self.namespaces.is_empty() {
            return None;
        }
        let namespace = &self.namespaces[index % self.namespaces.len()];
        Some(WorkloadRef::indexed(namespace.clone(), &self.prefix, index))
    }
}

#[async_trait]
impl BatchHandler for GenerateHandler {
    type Item = WorkloadRef;

    async fn produce(&self, index: usize) -> anyhow::Result<WorkloadRef> {
        let workload = self.workload_for(index).context("no target namespaces")?;

        let spec = WorkloadSpec {
            namespace: workload.namespace.clone(),
            name: workload.name.clone(),
            image: self.image.clone(),
            min_scale: self.min_scale,
            max_scale: self.max_scale,
        };
        self.cluster
            .create_workload(&spec)
            .await
            .with_context(|| format!("creating workload {}", workload))?;

        debug!(index, workload = %workload, "Workload created");
        Ok(workload)
    }

    async fn complete(&self, workload: WorkloadRef) -> anyhow::Result<()> {
        match self.wait {
            Some(wait) => {
                let took = wait_until_ready(self.cluster.as_ref(), &workload, wait.timeout, wait.check_interval).await?;
                info!(workload = %workload, ready_ms = took.as_millis() as u64, "Workload ready");
            }
            None => info!(workload = %workload, "Workload generated"),
        }
        Ok(())
    }
}

/// Poll a workload's Ready condition every `check_interval` until `timeout`
pub async fn wait_until_ready(
    cluster: &dyn ClusterClient,
    workload: &WorkloadRef,
    timeout: Duration,
    check_interval: Duration,
) -> MeasureResult<Duration> {
    let start = Instant::now();
    let deadline = start + timeout;

    loop {
        let current = cluster.get_workload(&workload.namespace, &workload.name).await?;
        if current.ready {
            return Ok(start.elapsed());
        }
        if Instant::now() + check_interval > deadline {
            return Err(MeasureError::NotReady {
                workload: workload.clone(),
                timeout,
            });
        }
        tokio::time::sleep(check_interval).await;
    }
}

/// Create the namespaces that do not exist yet; returns the created ones
pub async fn ensure_namespaces(cluster: &dyn ClusterClient, namespaces: &[String]) -> ClusterResult<Vec<String>> {
    let existing: HashSet<String> = cluster.list_namespaces().await?.into_iter().collect();
    let mut created = Vec::new();

    for namespace in namespaces.iter().filter(|ns| !existing.contains(*ns)) {
        cluster.create_namespace(namespace).await?;
        created.push(namespace.clone());
    }
    Ok(created)
}

/// Workloads named `{prefix}-…` in the given namespaces, ordered by index
pub async fn discover_workloads(
    cluster: &dyn ClusterClient,
    namespaces: &[String],
    prefix: &str,
) -> ClusterResult<Vec<WorkloadRef>> {
    let name_prefix = format!("{}-", prefix);
    let mut found = Vec::new();

    for namespace in namespaces {
        let workloads = cluster.list_workloads(namespace).await?;
        found.extend(
            workloads
                .iter()
                .filter(|w| w.name.starts_with(&name_prefix))
                .map(|w| w.workload_ref()),
        );
    }

    sort_by_numeric_suffix(&mut found, |w| w);
    Ok(found)
}

/// Outcome of a fleet cleanup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub attempted: usize,
    pub deleted: usize,
    pub failures: Vec<(WorkloadRef, String)>,
}

/// Delete every prefixed workload in the target namespaces, best effort
pub async fn clean_workloads(
    cluster: Arc<dyn ClusterClient>,
    namespaces: &[String],
    prefix: &str,
    concurrency: usize,
) -> MeasureResult<CleanReport> {
    let targets = discover_workloads(cluster.as_ref(), namespaces, prefix).await?;
    info!(count = targets.len(), "Deleting workloads");

    let deleter = cluster.clone();
    let report = clean(targets.clone(), concurrency, move |workload: WorkloadRef| {
        let cluster = deleter.clone();
        async move {
            cluster
                .delete_workload(&workload.namespace, &workload.name)
                .await
                .with_context(|| format!("deleting workload {}", workload))
        }
    })
    .await?;

    let failures = report
        .failures
        .iter()
        .filter_map(|f| targets.get(f.index).map(|w| (w.clone(), f.error.clone())))
        .collect();

    Ok(CleanReport {
        attempted: targets.len(),
        deleted: report.completed,
        failures,
    })
}

/// Delete the given namespaces, best effort
pub async fn delete_namespaces(
    cluster: Arc<dyn ClusterClient>,
    namespaces: Vec<String>,
    concurrency: usize,
) -> MeasureResult<usize> {
    let report = clean(namespaces, concurrency, move |namespace: String| {
        let cluster = cluster.clone();
        async move {
            cluster
                .delete_namespace(&namespace)
                .await
                .with_context(|| format!("deleting namespace {}", namespace))
        }
    })
    .await?;
    Ok(report.completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalebench_cluster::testing::MockCluster;
    use scalebench_cluster::{ClusterError, Workload};

    fn workload(namespace: &str, name: &str, ready: bool) -> Workload {
        Workload {
            namespace: namespace.to_string(),
            name: name.to_string(),
            url: None,
            ready,
        }
    }

    fn namespaces() -> Vec<String> {
        vec!["bench-1".to_string(), "bench-2".to_string()]
    }

    #[tokio::test]
    async fn test_generate_round_robins_namespaces() {
        let mut cluster = MockCluster::new();
        cluster.expect_create_workload().times(3).returning(|spec| {
            assert_eq!(spec.min_scale, Some(0));
            assert_eq!(spec.max_scale, Some(3));
            Ok(workload(&spec.namespace, &spec.name, false))
        });

        let config = GenerateConfig {
            max_scale: 3,
            ..Default::default()
        };
        let handler = GenerateHandler::new(Arc::new(cluster), namespaces(), &ClusterConfig::default(), &config);

        let mut produced = Vec::new();
        for index in 0..3 {
            produced.push(handler.produce(index).await.unwrap().to_string());
        }
        assert_eq!(produced, vec!["bench-1/ksvc-0", "bench-2/ksvc-1", "bench-1/ksvc-2"]);
    }

    #[tokio::test]
    async fn test_create_failure_names_workload() {
        let mut cluster = MockCluster::new();
        cluster.expect_create_workload().returning(|_| {
            Err(ClusterError::Watch {
                target: "quota".to_string(),
                message: "exceeded".to_string(),
            })
        });
        let handler = GenerateHandler::new(
            Arc::new(cluster),
            namespaces(),
            &ClusterConfig::default(),
            &GenerateConfig::default(),
        );

        let err = handler.produce(1).await.unwrap_err();
        assert_eq!(err.to_string(), "creating workload bench-2/ksvc-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_polls() {
        let mut cluster = MockCluster::new();
        let mut calls = 0;
        cluster.expect_get_workload().returning(move |ns, name| {
            calls += 1;
            Ok(workload(ns, name, calls >= 3))
        });

        let took = wait_until_ready(
            &cluster,
            &WorkloadRef::new("bench-1", "ksvc-0"),
            Duration::from_secs(10),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(took, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_times_out() {
        let mut cluster = MockCluster::new();
        cluster
            .expect_get_workload()
            .returning(|ns, name| Ok(workload(ns, name, false)));

        let err = wait_until_ready(
            &cluster,
            &WorkloadRef::new("bench-1", "ksvc-0"),
            Duration::from_secs(3),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MeasureError::NotReady { .. }));
    }

    #[tokio::test]
    async fn test_ensure_namespaces_creates_missing() {
        let mut cluster = MockCluster::new();
        cluster
            .expect_list_namespaces()
            .returning(|| Ok(vec!["default".to_string(), "bench-1".to_string()]));
        cluster
            .expect_create_namespace()
            .times(1)
            .returning(|name| {
                assert_eq!(name, "bench-2");
                Ok(())
            });

        let created = ensure_namespaces(&cluster, &namespaces()).await.unwrap();
        assert_eq!(created, vec!["bench-2".to_string()]);
    }

    #[tokio::test]
    async fn test_clean_only_prefixed_and_best_effort() {
        let mut cluster = MockCluster::new();
        cluster.expect_list_workloads().returning(|ns| {
            Ok(vec![
                workload(ns, "ksvc-1", true),
                workload(ns, "ksvc-0", true),
                workload(ns, "other", true),
            ])
        });
        cluster.expect_delete_workload().times(4).returning(|ns, name| {
            if ns == "bench-2" && name == "ksvc-1" {
                Err(ClusterError::missing("workload", "gone"))
            } else {
                Ok(())
            }
        });

        let report = clean_workloads(Arc::new(cluster), &namespaces(), "ksvc", 2).await.unwrap();

        assert_eq!(report.attempted, 4);
        assert_eq!(report.deleted, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0.to_string(), "bench-2/ksvc-1");
        assert!(report.failures[0].1.contains("deleting workload bench-2/ksvc-1"));
    }
}

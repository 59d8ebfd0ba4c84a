use anyhow::{Context, Result};
use scalebench_cluster::ClusterClient;
use scalebench_config::BenchConfig;
use scalebench_measure::{clean_workloads, delete_namespaces};
use std::sync::Arc;

/// Delete generated workloads, and optionally their namespaces
pub async fn handle_clean(
    cluster: Arc<dyn ClusterClient>,
    config: &BenchConfig,
    concurrency: usize,
    with_namespaces: bool,
) -> Result<()> {
    let namespaces = config.cluster.target_namespaces()?;

    let report = clean_workloads(cluster.clone(), &namespaces, &config.cluster.service_prefix, concurrency)
        .await
        .context("Failed to clean workloads")?;

    println!("Deleted {} of {} workloads", report.deleted, report.attempted);
    for (workload, reason) in &report.failures {
        println!("  {}: {}", workload, reason);
    }

    if with_namespaces {
        let deleted = delete_namespaces(cluster, namespaces.clone(), concurrency)
            .await
            .context("Failed to delete namespaces")?;
        println!("Deleted {} of {} namespaces", deleted, namespaces.len());
    }

    Ok(())
}

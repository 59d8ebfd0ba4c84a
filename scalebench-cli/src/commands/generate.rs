use anyhow::{Context, Result};
use scalebench_cluster::ClusterClient;
use scalebench_config::BenchConfig;
use scalebench_execution::{run_batch, BatchJob};
use scalebench_measure::{ensure_namespaces, GenerateHandler};
use std::sync::Arc;
use tracing::info;

/// Create the workload fleet described by the `generate` configuration
pub async fn handle_generate(cluster: Arc<dyn ClusterClient>, config: &BenchConfig) -> Result<()> {
    let namespaces = config.cluster.target_namespaces()?;
    let created = ensure_namespaces(cluster.as_ref(), &namespaces)
        .await
        .context("Failed to prepare target namespaces")?;
    if !created.is_empty() {
        info!("Created namespaces: {}", created.join(", "));
    }

    let handler = GenerateHandler::new(cluster, namespaces, &config.cluster, &config.generate);
    let job = BatchJob::from_generate_config(&config.generate, handler);
    let report = run_batch(job).await.context("Workload generation failed")?;

    println!(
        "Generated {} of {} workloads",
        report.completed, config.generate.count
    );
    for failure in &report.failures {
        println!("  #{}: {}", failure.index, failure.error);
    }

    Ok(())
}

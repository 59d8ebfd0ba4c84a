use anyhow::{Context, Result};
use scalebench_cluster::{ClusterClient, EndpointResolver};
use scalebench_config::BenchConfig;
use scalebench_measure::{discover_workloads, measure_all, MeasureSettings, MeasurementReport};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureMode {
    /// Scale from zero with the cold-start probe
    ColdStart,
    /// Scale under the configured load tool
    Sustained,
}

/// Measure every discovered workload and print the report
pub async fn handle_measure(cluster: Arc<dyn ClusterClient>, config: &BenchConfig, mode: MeasureMode) -> Result<()> {
    let namespaces = config.cluster.target_namespaces()?;
    let workloads = discover_workloads(cluster.as_ref(), &namespaces, &config.cluster.service_prefix)
        .await
        .context("Failed to list workloads")?;

    if workloads.is_empty() {
        warn!(
            "No workloads with prefix {} in {}",
            config.cluster.service_prefix,
            namespaces.join(", ")
        );
        return Ok(());
    }

    let settings = match mode {
        MeasureMode::ColdStart => MeasureSettings::cold_start(config),
        MeasureMode::Sustained => MeasureSettings::sustained(config),
    };
    let resolver = EndpointResolver::new(cluster.clone(), config.cluster.ingress.clone());

    let report = measure_all(cluster, resolver, workloads, settings).await?;
    print_report(&mut io::stdout().lock(), &report)?;

    Ok(())
}

/// Tab-separated rows followed by the summary and failure reasons
pub fn print_report(out: &mut impl Write, report: &MeasurementReport) -> io::Result<()> {
    writeln!(out, "{}", MeasurementReport::header().join("\t"))?;
    for row in report.rows() {
        writeln!(out, "{}", row.join("\t"))?;
    }

    writeln!(out)?;
    writeln!(out, "{}", report.summary())?;
    for failure in &report.failures {
        writeln!(out, "  {}: {}", failure.workload, failure.reason)?;
    }

    Ok(())
}

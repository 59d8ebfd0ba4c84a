//! Batch measurement

use scalebench_cluster::{ClusterClient, EndpointResolver};
use scalebench_config::BenchConfig;
use scalebench_core::WorkloadRef;
use scalebench_execution::run_unpaced;
use std::sync::Arc;
use tracing::info;

use crate::aggregate::{Aggregator, MeasurementReport};
use crate::error::MeasureResult;
use crate::probe::ProbeStrategy;
use crate::session::{MeasurementSession, SessionConfig};

/// How a batch of sessions is measured
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureSettings {
    pub strategy: ProbeStrategy,
    pub session: SessionConfig,
    /// Sessions in flight at once
    pub concurrency: usize,
}

impl MeasureSettings {
    /// Scale-from-zero measurement with the cold-start probe
    pub fn cold_start(config: &BenchConfig) -> Self {
        Self {
            strategy: ProbeStrategy::cold_start(&config.probe),
            session: SessionConfig {
                resolvable_domain: config.cluster.resolvable_domain,
                settle: config.probe.settle,
            },
            concurrency: config.probe.concurrency,
        }
    }

    /// Full load measurement with the configured load tool
    pub fn sustained(config: &BenchConfig) -> Self {
        Self {
            strategy: ProbeStrategy::sustained(&config.load),
            session: SessionConfig {
                resolvable_domain: config.cluster.resolvable_domain,
                settle: config.load.settle,
            },
            concurrency: config.load.concurrency,
        }
    }
}

/// Measure every workload, at most `concurrency` at a time.
///
/// A failing session is recorded with its reason and never stops the
/// others.
pub async fn measure_all(
    cluster: Arc<dyn ClusterClient>,
    resolver: EndpointResolver,
    workloads: Vec<WorkloadRef>,
    settings: MeasureSettings,
) -> MeasureResult<MeasurementReport> {
    info!(count = workloads.len(), concurrency = settings.concurrency, "Measuring workloads");

    let aggregator = Arc::new(Aggregator::new());
    let sink = aggregator.clone();
    let concurrency = settings.concurrency;
    let settings = Arc::new(settings);

    run_unpaced(workloads, concurrency, move |workload: WorkloadRef| {
        let cluster = cluster.clone();
        let resolver = resolver.clone();
        let sink = sink.clone();
        let settings = settings.clone();
        async move {
            let outcome = match MeasurementSession::new(
                cluster,
                resolver,
                workload.clone(),
                &settings.strategy,
                settings.session.clone(),
            ) {
                Ok(session) => session.run().await,
                Err(e) => Err(e),
            };
            sink.record(workload, outcome);
            Ok::<(), anyhow::Error>(())
        }
    })
    .await?;

    let report = aggregator.report();
    info!("Measurement finished: {}", report.summary());
    Ok(report)
}

//! Report row contract

use scalebench_core::SessionResult;
use std::time::Duration;

use crate::aggregate::MeasurementReport;

const HEADER: [&str; 10] = [
    "service",
    "namespace",
    "service_ready",
    "ready_replicas",
    "first_replica_ready",
    "last_replica_ready",
    "ready_pods",
    "pod_ready_min",
    "pod_ready_avg",
    "pod_ready_max",
];

/// Seconds with millisecond precision, `-` when absent
fn seconds(duration: Option<Duration>) -> String {
    duration
        .map(|d| format!("{:.3}", d.as_secs_f64()))
        .unwrap_or_else(|| "-".to_string())
}

/// One report row, in header order
pub fn row(result: &SessionResult) -> Vec<String> {
    let pod_stats = result.pod_ready_stats();
    vec![
        result.workload.name.clone(),
        result.workload.namespace.clone(),
        seconds(result.service_ready),
        result.total_ready_replicas.to_string(),
        seconds(result.first_replica_ready()),
        seconds(result.last_replica_ready()),
        result.total_ready_pods.to_string(),
        seconds(pod_stats.map(|(min, _, _)| min)),
        seconds(pod_stats.map(|(_, avg, _)| avg)),
        seconds(pod_stats.map(|(_, _, max)| max)),
    ]
}

impl MeasurementReport {
    pub fn header() -> Vec<String> {
        HEADER.iter().map(|h| h.to_string()).collect()
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.results.iter().map(row).collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "attempted: {}, succeeded: {}, failed: {}",
            self.attempted,
            self.succeeded,
            self.failures.len()
        )
    }
}

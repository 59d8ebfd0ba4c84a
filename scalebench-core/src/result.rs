//! Measurement results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::workload::WorkloadRef;

/// One step of a workload's ready-replica curve.
///
/// Within a session these are strictly increasing in `ready_replicas` and
/// non-decreasing in `ready_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaResult {
    pub ready_replicas: i32,
    pub ready_at: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    pub ready_after: Duration,
}

/// Creation-to-ready timing of a single pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodResult {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub ready_at: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    pub ready_duration: Duration,
}

impl PodResult {
    /// Build from timestamps; a ready time earlier than creation clamps to zero
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>, ready_at: DateTime<Utc>) -> Self {
        let ready_duration = (ready_at - created_at).to_std().unwrap_or(Duration::ZERO);
        Self {
            name: name.into(),
            created_at,
            ready_at,
            ready_duration,
        }
    }
}

/// Everything measured for one workload in one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub workload: WorkloadRef,
    pub total_ready_replicas: i32,
    pub total_ready_pods: usize,
    pub replica_results: Vec<ReplicaResult>,
    pub pod_results: Vec<PodResult>,
    pub probe_output: String,
    /// Time from session start to the first answered request (cold-start probes only)
    #[serde(default, with = "humantime_serde")]
    pub service_ready: Option<Duration>,
}

impl SessionResult {
    pub fn first_replica_ready(&self) -> Option<Duration> {
        self.replica_results.first().map(|r| r.ready_after)
    }

    pub fn last_replica_ready(&self) -> Option<Duration> {
        self.replica_results.last().map(|r| r.ready_after)
    }

    /// Minimum, mean and maximum pod ready durations
    pub fn pod_ready_stats(&self) -> Option<(Duration, Duration, Duration)> {
        let durations: Vec<Duration> = self.pod_results.iter().map(|p| p.ready_duration).collect();
        let min = durations.iter().min().copied()?;
        let max = durations.iter().max().copied()?;
        let total: Duration = durations.iter().sum();
        Some((min, total / durations.len() as u32, max))
    }
}

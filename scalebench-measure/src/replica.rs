//! Ready-replica curve

use chrono::{DateTime, Utc};
use scalebench_cluster::watch::EventKind;
use scalebench_cluster::DeploymentEvent;
use scalebench_core::ReplicaResult;
use std::time::Duration;

/// Turns deployment watch events into a monotonic ready-replica timeline.
///
/// A point is appended only when the ready count exceeds the highest count
/// seen so far, so re-deliveries, unrelated updates and scale-downs leave
/// the curve untouched.
#[derive(Debug, Clone)]
pub struct ReplicaCurveBuilder {
    session_start: DateTime<Utc>,
    results: Vec<ReplicaResult>,
}

impl ReplicaCurveBuilder {
    pub fn new(session_start: DateTime<Utc>) -> Self {
        Self {
            session_start,
            results: Vec::new(),
        }
    }

    /// Apply a watch event; only `Modified` events are considered
    pub fn apply(&mut self, event: &DeploymentEvent) -> bool {
        if event.kind != EventKind::Modified {
            return false;
        }
        self.observe_at(event.ready_replicas, Utc::now())
    }

    /// Record `ready_replicas` observed at `at`. Returns whether a point was added.
    pub fn observe_at(&mut self, ready_replicas: i32, at: DateTime<Utc>) -> bool {
        if ready_replicas <= self.highest() {
            return false;
        }

        // Keep timestamps non-decreasing even if the clock steps back
        let ready_at = match self.results.last() {
            Some(last) if last.ready_at > at => last.ready_at,
            _ => at,
        };
        let ready_after = (ready_at - self.session_start).to_std().unwrap_or(Duration::ZERO);

        self.results.push(ReplicaResult {
            ready_replicas,
            ready_at,
            ready_after,
        });
        true
    }

    /// Highest ready count recorded, zero before the first point
    pub fn highest(&self) -> i32 {
        self.results.last().map(|r| r.ready_replicas).unwrap_or(0)
    }

    pub fn results(&self) -> &[ReplicaResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ReplicaResult> {
        self.results
    }
}

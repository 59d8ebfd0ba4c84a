//! Result aggregation across sessions

use parking_lot::Mutex;
use scalebench_core::{sort_by_numeric_suffix, SessionResult, WorkloadRef};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::warn;

use crate::error::MeasureError;

/// A workload whose session failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementFailure {
    pub workload: WorkloadRef,
    pub reason: String,
}

/// Final outcome of a batch of sessions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<MeasurementFailure>,
    /// Ordered by the numeric suffix of the workload name
    pub results: Vec<SessionResult>,
}

#[derive(Debug, Default)]
struct AggregateState {
    attempted: usize,
    results: HashMap<WorkloadRef, SessionResult>,
    failures: Vec<MeasurementFailure>,
}

/// Collects session outcomes from concurrent workers.
///
/// [`record`](Self::record) is the only mutation and holds the lock just
/// long enough to store one outcome. Every call lands in exactly one of
/// results or failures, so `attempted == succeeded + failures.len()`.
#[derive(Debug, Default)]
pub struct Aggregator {
    state: Mutex<AggregateState>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, workload: WorkloadRef, outcome: Result<SessionResult, MeasureError>) {
        let mut state = self.state.lock();
        state.attempted += 1;

        let reason = match outcome {
            Ok(result) => match state.results.entry(workload.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(result);
                    return;
                }
                Entry::Occupied(_) => "result recorded more than once; kept the first".to_string(),
            },
            Err(e) => e.to_string(),
        };

        state.failures.push(MeasurementFailure {
            workload: workload.clone(),
            reason: reason.clone(),
        });
        drop(state);
        warn!(workload = %workload, "Measurement failed: {}", reason);
    }

    /// Snapshot the outcomes recorded so far
    pub fn report(&self) -> MeasurementReport {
        let (attempted, mut results, mut failures) = {
            let state = self.state.lock();
            (
                state.attempted,
                state.results.values().cloned().collect::<Vec<_>>(),
                state.failures.clone(),
            )
        };

        sort_by_numeric_suffix(&mut results, |r| &r.workload);
        sort_by_numeric_suffix(&mut failures, |f| &f.workload);

        MeasurementReport {
            attempted,
            succeeded: results.len(),
            failures,
            results,
        }
    }
}

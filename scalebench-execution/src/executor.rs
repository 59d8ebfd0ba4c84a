//! Paced, concurrency-bounded batch execution

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::batch::{BatchHandler, BatchJob, BatchReport, ItemFailure};
use crate::error::{ExecutionError, ExecutionResult};
use scalebench_config::FailurePolicy;

/// How indices enter the work queue
#[derive(Debug, Clone, Copy)]
enum Admission {
    /// Up to `batch_size` indices every `interval`, the first tick immediately
    Paced { batch_size: usize, interval: Duration },
    /// Every index at once
    Immediate,
}

/// Run a paced batch to completion.
///
/// A ticker admits up to `batch_size` indices per `interval` into a bounded
/// queue and `concurrency` workers pull from it, calling `produce` then
/// `complete`. Completion is counted here, from the workers' outcome
/// messages, and the batch ends once every index has reported.
///
/// Under [`FailurePolicy::FailFast`] the first failing item stops the
/// ticker and all workers and is returned as [`ExecutionError::ItemFailed`].
/// Under [`FailurePolicy::BestEffort`] failures are logged and collected in
/// the report.
pub async fn run_batch<H: BatchHandler>(job: BatchJob<H>) -> ExecutionResult<BatchReport> {
    let BatchJob {
        total_count,
        batch_size,
        interval,
        concurrency,
        failure_policy,
        handler,
    } = job;

    let admission = Admission::Paced {
        batch_size: batch_size.max(1),
        interval,
    };
    execute(total_count, admission, concurrency, failure_policy, handler).await
}

/// Run a fixed list of items through `op` with at most `concurrency` in flight.
///
/// No pacing: the whole list is admitted at once. Failures never abort the
/// other items.
pub async fn run_unpaced<T, F, Fut>(items: Vec<T>, concurrency: usize, op: F) -> ExecutionResult<BatchReport>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let total = items.len();
    let handler = ListHandler {
        slots: items.into_iter().map(|item| SyncMutex::new(Some(item))).collect(),
        op,
        _future: PhantomData,
    };
    execute(total, Admission::Immediate, concurrency, FailurePolicy::BestEffort, Arc::new(handler)).await
}

/// Best-effort deletion of a fixed list of items
pub async fn clean<T, F, Fut>(items: Vec<T>, concurrency: usize, delete: F) -> ExecutionResult<BatchReport>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let total = items.len();
    let report = run_unpaced(items, concurrency, delete).await?;
    info!(
        total,
        deleted = report.completed,
        failed = report.failures.len(),
        "Clean finished"
    );
    Ok(report)
}

/// Adapts a list and a per-item operation to the producer/consumer protocol
struct ListHandler<T, F, Fut> {
    slots: Vec<SyncMutex<Option<T>>>,
    op: F,
    _future: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<T, F, Fut> BatchHandler for ListHandler<T, F, Fut>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    type Item = T;

    async fn produce(&self, index: usize) -> anyhow::Result<T> {
        self.slots
            .get(index)
            .and_then(|slot| slot.lock().take())
            .with_context(|| format!("item {} was already taken", index))
    }

    async fn complete(&self, item: T) -> anyhow::Result<()> {
        (self.op)(item).await
    }
}

async fn execute<H: BatchHandler>(
    total: usize,
    admission: Admission,
    concurrency: usize,
    policy: FailurePolicy,
    handler: Arc<H>,
) -> ExecutionResult<BatchReport> {
    let mut report = BatchReport::default();
    if total == 0 {
        debug!("Empty batch, nothing to run");
        return Ok(report);
    }

    let capacity = match admission {
        Admission::Paced { batch_size, .. } => batch_size,
        Admission::Immediate => total,
    };
    let (queue_tx, queue_rx) = mpsc::channel::<usize>(capacity);
    let queue_rx = Arc::new(Mutex::new(queue_rx));
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<(usize, anyhow::Result<()>)>();

    let concurrency = concurrency.max(1);
    info!(total, concurrency, ?admission, ?policy, "Starting batch");

    // Dropping the set on any return aborts the ticker and the workers
    let mut tasks = JoinSet::new();
    tasks.spawn(admit(queue_tx, total, admission));
    for worker in 0..concurrency {
        tasks.spawn(work(worker, handler.clone(), queue_rx.clone(), outcome_tx.clone()));
    }
    drop(outcome_tx);

    while report.processed() < total {
        let Some((index, outcome)) = outcome_rx.recv().await else {
            return Err(ExecutionError::WorkersExited {
                processed: report.processed(),
                total,
            });
        };

        match outcome {
            Ok(()) => report.completed += 1,
            Err(error) => match policy {
                FailurePolicy::FailFast => {
                    warn!(index, "Item failed, stopping batch: {:#}", error);
                    tasks.abort_all();
                    return Err(ExecutionError::ItemFailed { index, source: error });
                }
                FailurePolicy::BestEffort => {
                    warn!(index, "Item failed: {:#}", error);
                    report.failures.push(ItemFailure {
                        index,
                        error: format!("{:#}", error),
                    });
                }
            },
        }
    }

    tasks.abort_all();
    info!(completed = report.completed, failed = report.failures.len(), "Batch finished");
    Ok(report)
}

async fn admit(queue: mpsc::Sender<usize>, total: usize, admission: Admission) {
    match admission {
        Admission::Immediate => {
            for index in 0..total {
                if queue.send(index).await.is_err() {
                    return;
                }
            }
        }
        Admission::Paced { batch_size, interval: period } => {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut next = 0;
            while next < total {
                ticker.tick().await;
                let end = (next + batch_size).min(total);
                debug!(from = next, to = end, "Admitting batch");
                for index in next..end {
                    if queue.send(index).await.is_err() {
                        return;
                    }
                }
                next = end;
            }
        }
    }
}

async fn work<H: BatchHandler>(
    worker: usize,
    handler: Arc<H>,
    queue: Arc<Mutex<mpsc::Receiver<usize>>>,
    outcomes: mpsc::UnboundedSender<(usize, anyhow::Result<()>)>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(index) = next else {
            break;
        };

        debug!(worker, index, "Processing item");
        let outcome = match handler.produce(index).await {
            Ok(item) => handler.complete(item).await,
            Err(e) => Err(e.context(format!("producing item {}", index))),
        };

        if outcomes.send((index, outcome)).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[derive(Default)]
    struct Counting {
        produced: AtomicUsize,
        completed: AtomicUsize,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl BatchHandler for Counting {
        type Item = usize;

        async fn produce(&self, index: usize) -> anyhow::Result<usize> {
            self.produced.fetch_add(1, Ordering::SeqCst);
            Ok(index)
        }

        async fn complete(&self, item: usize) -> anyhow::Result<()> {
            self.completed.fetch_add(1, Ordering::SeqCst);
            if Some(item) == self.fail_at {
                anyhow::bail!("create ksvc-{} failed", item);
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_items_completes_without_ticking() {
        let job = BatchJob::new(0, Counting::default()).with_pacing(2, Duration::from_secs(60));
        let handler = job.handler.clone();
        let start = Instant::now();

        let report = run_batch(job).await.unwrap();

        assert_eq!(report, BatchReport::default());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(handler.produced.load(Ordering::SeqCst), 0);
        assert_eq!(handler.completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_lower_bound() {
        let job = BatchJob::new(8, Counting::default())
            .with_pacing(2, Duration::from_secs(1))
            .with_concurrency(2);
        let handler = job.handler.clone();
        let start = Instant::now();

        let report = run_batch(job).await.unwrap();

        // Four ticks, the first one immediate
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() <= Duration::from_secs(5));
        assert_eq!(report.completed, 8);
        assert_eq!(handler.produced.load(Ordering::SeqCst), 8);
        assert_eq!(handler.completed.load(Ordering::SeqCst), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_size_larger_than_remaining() {
        let job = BatchJob::new(3, Counting::default())
            .with_pacing(10, Duration::from_secs(1))
            .with_concurrency(5);
        let start = Instant::now();

        let report = run_batch(job).await.unwrap();

        assert_eq!(report.completed, 3);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_stops_early() {
        let handler = Counting {
            fail_at: Some(3),
            ..Default::default()
        };
        let job = BatchJob::new(20, handler)
            .with_pacing(2, Duration::from_secs(1))
            .with_concurrency(2)
            .with_failure_policy(FailurePolicy::FailFast);
        let handler = job.handler.clone();
        let start = Instant::now();

        let err = run_batch(job).await.unwrap_err();

        match err {
            ExecutionError::ItemFailed { index, source } => {
                assert_eq!(index, 3);
                assert!(source.to_string().contains("ksvc-3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Full schedule would need nine more ticks
        assert!(start.elapsed() < Duration::from_secs(9));
        assert!(handler.completed.load(Ordering::SeqCst) < 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_best_effort_collects_failures() {
        let handler = Counting {
            fail_at: Some(1),
            ..Default::default()
        };
        let job = BatchJob::new(4, handler)
            .with_pacing(4, Duration::from_secs(1))
            .with_concurrency(2)
            .with_failure_policy(FailurePolicy::BestEffort);

        let report = run_batch(job).await.unwrap();

        assert_eq!(report.completed, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert!(report.failures[0].error.contains("ksvc-1"));
    }

    #[tokio::test]
    async fn test_clean_is_best_effort() {
        let deleted = Arc::new(AtomicUsize::new(0));
        let deleted_clone = deleted.clone();
        let items: Vec<String> = (0..6).map(|i| format!("ksvc-{}", i)).collect();

        let report = clean(items, 3, move |name: String| {
            let deleted = deleted_clone.clone();
            async move {
                if name == "ksvc-2" {
                    anyhow::bail!("delete {} forbidden", name);
                }
                deleted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(deleted.load(Ordering::SeqCst), 5);
        assert_eq!(report.completed, 5);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.contains("ksvc-2"));
    }

    #[tokio::test]
    async fn test_unpaced_respects_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (in_flight_c, peak_c) = (in_flight.clone(), peak.clone());

        let report = run_unpaced((0..12).collect::<Vec<usize>>(), 3, move |_| {
            let in_flight = in_flight_c.clone();
            let peak = peak_c.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(report.completed, 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}

//! Batch job description

use async_trait::async_trait;
use scalebench_config::{FailurePolicy, GenerateConfig};
use std::sync::Arc;
use std::time::Duration;

/// Producer and consumer callbacks of a batch.
///
/// `produce` turns an index into a work item, `complete` finishes it. An
/// error from either marks the item failed.
#[async_trait]
pub trait BatchHandler: Send + Sync + 'static {
    type Item: Send + 'static;

    async fn produce(&self, index: usize) -> anyhow::Result<Self::Item>;

    async fn complete(&self, item: Self::Item) -> anyhow::Result<()>;
}

/// One paced batch run. Consumed by [`crate::run_batch`].
pub struct BatchJob<H> {
    pub total_count: usize,
    /// Indices admitted per tick
    pub batch_size: usize,
    pub interval: Duration,
    /// Worker pool size
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
    pub handler: Arc<H>,
}

impl<H: BatchHandler> BatchJob<H> {
    pub fn new(total_count: usize, handler: H) -> Self {
        Self {
            total_count,
            batch_size: 1,
            interval: Duration::from_secs(1),
            concurrency: 1,
            failure_policy: FailurePolicy::default(),
            handler: Arc::new(handler),
        }
    }

    /// Pacing and failure policy from the generation settings
    pub fn from_generate_config(config: &GenerateConfig, handler: H) -> Self {
        Self {
            total_count: config.count,
            batch_size: config.batch_size,
            interval: config.interval,
            concurrency: config.concurrency,
            failure_policy: config.failure_policy,
            handler: Arc::new(handler),
        }
    }

    pub fn with_pacing(mut self, batch_size: usize, interval: Duration) -> Self {
        self.batch_size = batch_size;
        self.interval = interval;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// A failed item recorded under the best-effort policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub index: usize,
    pub error: String,
}

/// Outcome of a batch that ran to the end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Items whose callbacks both succeeded
    pub completed: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.completed + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

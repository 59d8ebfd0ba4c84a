//! Workload fleet generation configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};

/// How a batch reacts to a failing item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole batch on the first failure
    #[default]
    FailFast,
    /// Log the failure and keep going
    BestEffort,
}

/// Paced workload generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Total number of workloads to create
    #[serde(default = "default_count")]
    pub count: usize,

    /// Workloads admitted per interval tick
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(with = "humantime_serde", default = "default_interval")]
    pub interval: Duration,

    /// Concurrent creation workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Container image for generated workloads
    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default)]
    pub min_scale: u32,

    /// Zero means unbounded
    #[serde(default)]
    pub max_scale: u32,

    /// Wait for each workload to report Ready before counting it done
    #[serde(default)]
    pub wait_ready: bool,

    #[serde(with = "humantime_serde", default = "default_ready_timeout")]
    pub ready_timeout: Duration,

    #[serde(with = "humantime_serde", default = "default_check_interval")]
    pub check_interval: Duration,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            batch_size: default_batch_size(),
            interval: default_interval(),
            concurrency: default_concurrency(),
            image: default_image(),
            min_scale: 0,
            max_scale: 0,
            wait_ready: false,
            ready_timeout: default_ready_timeout(),
            check_interval: default_check_interval(),
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

impl Validatable for GenerateConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.batch_size, "batch_size", self.domain_name())?;
        validate_positive(self.interval.as_millis(), "interval", self.domain_name())?;
        validate_positive(self.concurrency, "concurrency", self.domain_name())?;
        validate_required_string(&self.image, "image", self.domain_name())?;
        validate_positive(self.check_interval.as_millis(), "check_interval", self.domain_name())?;

        if self.max_scale != 0 && self.min_scale > self.max_scale {
            return Err(self.validation_error(format!(
                "min_scale ({}) cannot exceed max_scale ({})",
                self.min_scale, self.max_scale
            )));
        }

        if self.wait_ready {
            validate_positive(self.ready_timeout.as_millis(), "ready_timeout", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "generate"
    }
}

// Default value functions
fn default_count() -> usize {
    10
}

fn default_batch_size() -> usize {
    10
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_concurrency() -> usize {
    10
}

fn default_image() -> String {
    "gcr.io/knative-samples/helloworld-go".to_string()
}

fn default_ready_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_check_interval() -> Duration {
    Duration::from_secs(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_config_defaults() {
        let config = GenerateConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_config_validation() {
        let mut config = GenerateConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        config = GenerateConfig::default();
        config.min_scale = 5;
        config.max_scale = 2;
        assert!(config.validate().is_err());

        // Zero workloads is a valid, empty batch
        config = GenerateConfig::default();
        config.count = 0;
        assert!(config.validate().is_ok());
    }
}

//! Cold-start probe configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

/// Single-request scale-from-zero probing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Attempts before the probe gives up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between attempts
    #[serde(with = "humantime_serde", default = "default_request_interval")]
    pub request_interval: Duration,

    /// Hard budget for the whole probe, independent of retries
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Delay after the probe answers before pods are collected
    #[serde(with = "humantime_serde", default = "default_settle")]
    pub settle: Duration,

    /// Sessions measured at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            request_interval: default_request_interval(),
            request_timeout: default_request_timeout(),
            settle: default_settle(),
            concurrency: default_concurrency(),
        }
    }
}

impl Validatable for ProbeConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_retries, "max_retries", self.domain_name())?;
        validate_positive(self.request_timeout.as_millis(), "request_timeout", self.domain_name())?;
        validate_positive(self.concurrency, "concurrency", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "probe"
    }
}

// Default value functions
fn default_max_retries() -> u32 {
    3
}

fn default_request_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_settle() -> Duration {
    Duration::from_secs(5)
}

fn default_concurrency() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_config_validation() {
        let mut config = ProbeConfig::default();
        assert!(config.validate().is_ok());

        config.max_retries = 0;
        assert!(config.validate().is_err());

        config = ProbeConfig::default();
        config.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}

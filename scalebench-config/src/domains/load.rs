//! Sustained load configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_enum_choice, validate_positive, Validatable};

/// Tool names accepted by `load.tool`
pub const SUPPORTED_TOOLS: &[&str] = &["default", "hey", "wrk"];

/// Sustained traffic generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// `default` runs the in-process generator, anything else names an external tool
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Target requests per second
    #[serde(default = "default_rate")]
    pub rate: u32,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(with = "humantime_serde", default = "default_duration")]
    pub duration: Duration,

    /// Delay after load ends before pods are collected
    #[serde(with = "humantime_serde", default = "default_settle")]
    pub settle: Duration,

    /// Sessions measured at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            rate: default_rate(),
            workers: default_workers(),
            duration: default_duration(),
            settle: default_settle(),
            concurrency: default_concurrency(),
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_enum_choice(&self.tool, SUPPORTED_TOOLS, "tool", self.domain_name())?;
        validate_positive(self.rate, "rate", self.domain_name())?;
        validate_positive(self.workers, "workers", self.domain_name())?;
        validate_positive(self.duration.as_millis(), "duration", self.domain_name())?;
        validate_positive(self.concurrency, "concurrency", self.domain_name())?;

        if (self.rate as usize) < self.workers && self.tool != "default" {
            log::warn!(
                "load rate {} is below {} workers; {} sends at least 1 rps per worker",
                self.rate,
                self.workers,
                self.tool
            );
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

// Default value functions
fn default_tool() -> String {
    "default".to_string()
}

fn default_rate() -> u32 {
    100
}

fn default_workers() -> usize {
    10
}

fn default_duration() -> Duration {
    Duration::from_secs(30)
}

fn default_settle() -> Duration {
    Duration::from_secs(10)
}

fn default_concurrency() -> usize {
    1
}

//! Probe settings derived from the configuration domains

use scalebench_config::{LoadConfig, ProbeConfig};
use std::time::Duration;

/// Cold-start probe settings
#[derive(Debug, Clone, PartialEq)]
pub struct ColdStartSettings {
    /// Attempts before giving up
    pub max_retries: u32,

    /// Pause between attempts
    pub request_interval: Duration,

    /// Hard budget for the whole probe
    pub request_timeout: Duration,
}

impl Default for ColdStartSettings {
    fn default() -> Self {
        Self::from(&ProbeConfig::default())
    }
}

impl From<&ProbeConfig> for ColdStartSettings {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            request_interval: config.request_interval,
            request_timeout: config.request_timeout,
        }
    }
}

/// In-process load generator settings
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSettings {
    /// Target requests per second across all workers
    pub rate: u32,
    pub workers: usize,
    pub duration: Duration,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self::from(&LoadConfig::default())
    }
}

impl From<&LoadConfig> for LoadSettings {
    fn from(config: &LoadConfig) -> Self {
        Self {
            rate: config.rate,
            workers: config.workers,
            duration: config.duration,
        }
    }
}

//! Domain-specific configuration modules

pub mod cluster;
pub mod generate;
pub mod load;
pub mod logging;
pub mod probe;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main scalebench configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BenchConfig {
    /// Target cluster and ingress configuration
    #[serde(default)]
    pub cluster: cluster::ClusterConfig,

    /// Workload fleet generation
    #[serde(default)]
    pub generate: generate::GenerateConfig,

    /// Cold-start probing
    #[serde(default)]
    pub probe: probe::ProbeConfig,

    /// Sustained load measurement
    #[serde(default)]
    pub load: load::LoadConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl BenchConfig {
    /// Check every domain, stopping at the first invalid one
    pub fn validate_all(&self) -> ConfigResult<()> {
        let domains: [&dyn Validatable; 5] = [&self.cluster, &self.generate, &self.probe, &self.load, &self.logging];
        domains.iter().try_for_each(|domain| domain.validate())
    }

    /// Defaults rendered as YAML, targeting two numbered namespaces
    pub fn generate_sample() -> String {
        let mut config = BenchConfig::default();
        config.cluster.namespace_prefix = Some("scalebench".to_string());
        config.cluster.namespace_range = Some("1,2".to_string());

        match serde_yaml::to_string(&config) {
            Ok(yaml) => format!("# scalebench configuration\n{}", yaml),
            Err(e) => format!("# sample unavailable: {}\n", e),
        }
    }
}

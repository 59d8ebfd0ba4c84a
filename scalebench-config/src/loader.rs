//! Configuration loading and environment variable handling

use std::path::Path;
use std::str::FromStr;

use crate::domains::BenchConfig;
use crate::error::{ConfigError, ConfigResult};

/// Reads YAML, layers `{prefix}_*` environment overrides on top and
/// validates every domain
pub struct ConfigLoader {
    prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::with_prefix("SCALEBENCH")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<BenchConfig> {
        let content = std::fs::read_to_string(path)?;
        self.finish(serde_yaml::from_str(&content)?)
    }

    /// Defaults plus environment overrides
    pub fn from_env(&self) -> ConfigResult<BenchConfig> {
        self.finish(BenchConfig::default())
    }

    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<BenchConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn finish(&self, mut config: BenchConfig) -> ConfigResult<BenchConfig> {
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    fn apply_env_overrides(&self, config: &mut BenchConfig) -> ConfigResult<()> {
        if let Some(level) = self.parsed("LOG_LEVEL")? {
            config.logging.level = level;
        }
        if let Some(format) = self.parsed("LOG_FORMAT")? {
            config.logging.format = format;
        }
        if let Some(namespace) = self.var("NAMESPACE") {
            config.cluster.namespace = Some(namespace);
        }
        if let Some(resolvable) = self.parsed("RESOLVABLE_DOMAIN")? {
            config.cluster.resolvable_domain = resolvable;
        }
        if let Some(concurrency) = self.parsed("GENERATE_CONCURRENCY")? {
            config.generate.concurrency = concurrency;
        }
        if let Some(retries) = self.parsed("PROBE_MAX_RETRIES")? {
            config.probe.max_retries = retries;
        }
        if let Some(tool) = self.var("LOAD_TOOL") {
            config.load.tool = tool;
        }
        Ok(())
    }

    fn var(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.prefix, name)).ok()
    }

    fn parsed<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.var(name)
            .map(|value| {
                value
                    .parse()
                    .map_err(|e| ConfigError::EnvError(format!("{}_{}: {}", self.prefix, name, e)))
            })
            .transpose()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

//! Configuration error types

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything that can make a configuration unusable.
///
/// All variants are configuration errors in the sense that retrying
/// without changing input cannot help.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read configuration file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Malformed configuration YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `SCALEBENCH_*` variable that does not parse
    #[error("Bad environment override: {0}")]
    EnvError(String),

    /// Malformed `start,end` range
    #[error("Invalid range '{input}': {reason}")]
    InvalidRange { input: String, reason: String },

    #[error("Invalid {domain} configuration: {message}")]
    DomainError { domain: String, message: String },
}

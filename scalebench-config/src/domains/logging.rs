//! Logging configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};

/// Subscriber settings for the `scalebench` binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,

    pub format: LogFormat,

    /// Print file and line of each event
    pub source_location: bool,

    /// Extra `target=level` directives, e.g. `kube_client=debug`
    #[serde(default = "default_directives")]
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            source_location: false,
            directives: default_directives(),
        }
    }
}

impl LoggingConfig {
    /// Filter string for the subscriber: the base level first, directives after
    pub fn filter(&self) -> String {
        std::iter::once(self.level.as_str().to_string())
            .chain(self.directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

const LEVEL_NAMES: [(LogLevel, &str); 5] = [
    (LogLevel::Error, "error"),
    (LogLevel::Warn, "warn"),
    (LogLevel::Info, "info"),
    (LogLevel::Debug, "debug"),
    (LogLevel::Trace, "trace"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Full human-readable lines
    #[default]
    Text,
    Compact,
    /// Multi-line output for local debugging
    Pretty,
    /// One JSON object per event
    Json,
}

const FORMAT_NAMES: [(LogFormat, &str); 4] = [
    (LogFormat::Text, "text"),
    (LogFormat::Compact, "compact"),
    (LogFormat::Pretty, "pretty"),
    (LogFormat::Json, "json"),
];

fn lookup<T: Copy>(table: &[(T, &'static str)], input: &str) -> Option<T> {
    table
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(input))
        .map(|(value, _)| *value)
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        LEVEL_NAMES
            .iter()
            .find(|(level, _)| level == self)
            .map_or("info", |(_, name)| name)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("warning") {
            return Ok(LogLevel::Warn);
        }
        lookup(&LEVEL_NAMES, s).ok_or_else(|| format!("Invalid log level: {}", s))
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&FORMAT_NAMES, s).ok_or_else(|| format!("Invalid log format: {}", s))
    }
}

impl Validatable for LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        for directive in &self.directives {
            validate_required_string(directive, "directives", self.domain_name())?;
            if !directive.contains('=') {
                return Err(self.validation_error(format!(
                    "directive '{}' must have the form target=level",
                    directive
                )));
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "logging"
    }
}

/// HTTP and TLS internals are noisy at debug level
fn default_directives() -> Vec<String> {
    vec!["hyper=warn".to_string(), "rustls=warn".to_string()]
}

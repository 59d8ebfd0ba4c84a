//! Domain-driven configuration management for scalebench
//!
//! Configuration is split by functional domain (cluster, generation,
//! probing, sustained load, logging). Every domain has defaults and
//! validation, and the loader layers `SCALEBENCH_*` environment variables
//! on top of an optional YAML file.

pub mod error;
pub mod loader;
pub mod range;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use range::parse_range;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    cluster::{ClusterConfig, IngressConfig},
    generate::{FailurePolicy, GenerateConfig},
    load::LoadConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    probe::ProbeConfig,
    BenchConfig,
};

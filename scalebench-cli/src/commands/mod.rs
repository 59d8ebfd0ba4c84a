//! CLI command implementations

pub mod clean;
pub mod config;
pub mod generate;
pub mod measure;

pub use clean::handle_clean;
pub use config::{handle_config_sample, handle_config_show, handle_config_validate};
pub use generate::handle_generate;
pub use measure::{handle_measure, MeasureMode};

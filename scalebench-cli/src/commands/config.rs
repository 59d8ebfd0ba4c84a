use anyhow::{Context, Result};
use scalebench_config::{BenchConfig, ConfigLoader};
use std::path::Path;
use tracing::info;

pub fn handle_config_sample() -> Result<()> {
    print!("{}", BenchConfig::generate_sample());
    Ok(())
}

/// Handle configuration validation
pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!("Configuration file not found: {:?}", config_file));
    }

    ConfigLoader::new()
        .from_file(config_file)
        .with_context(|| format!("Configuration in {:?} is invalid", config_file))?;

    println!("Configuration file is valid");
    Ok(())
}

/// Print the effective configuration as YAML
pub fn handle_config_show(config: &BenchConfig) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}

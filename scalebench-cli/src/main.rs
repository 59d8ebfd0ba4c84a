use anyhow::{anyhow, Context, Result};
use clap::Parser;
use scalebench_cluster::{ClusterClient, KubeCluster};
use scalebench_config::{BenchConfig, ConfigLoader, LogLevel};
use scalebench_logging::init_logging;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};
use commands::MeasureMode;

/// Where the configuration came from, reported once logging is up
#[derive(Debug, Clone, PartialEq)]
enum ConfigSource {
    File(PathBuf),
    MissingFile(PathBuf),
    Environment,
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => debug!("Loaded configuration from {:?}", path),
            ConfigSource::MissingFile(path) => {
                warn!("Configuration file not found: {:?}. Using defaults.", path)
            }
            ConfigSource::Environment => {
                debug!("No configuration file specified. Loaded from environment or defaults.")
            }
        }
    }
}

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<(BenchConfig, ConfigSource)> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) if path.exists() => {
            let config = loader
                .from_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))?;
            Ok((config, ConfigSource::File(path.clone())))
        }
        Some(path) => {
            let config = loader
                .from_env()
                .context("Failed to load configuration from environment")?;
            Ok((config, ConfigSource::MissingFile(path.clone())))
        }
        None => {
            let config = loader
                .from_env()
                .context("Failed to load configuration from environment")?;
            Ok((config, ConfigSource::Environment))
        }
    }
}

async fn connect() -> Result<Arc<dyn ClusterClient>> {
    let cluster = KubeCluster::try_default()
        .await
        .context("Failed to connect to the cluster")?;
    Ok(Arc::new(cluster))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Sample output must not depend on a loadable configuration
    if let Commands::Config {
        config_cmd: ConfigCommands::Sample,
    } = &cli.command
    {
        return commands::handle_config_sample();
    }

    let (mut config, source) = load_config(cli.config.as_ref())?;
    cli.command.apply_overrides(&mut config);
    if let Some(level) = &cli.log_level {
        config.logging.level = LogLevel::from_str(level).map_err(|e| anyhow!(e))?;
    }
    config.validate_all().context("Invalid configuration")?;

    init_logging(&config.logging)?;
    info!("scalebench {} starting", env!("CARGO_PKG_VERSION"));
    source.log();

    match &cli.command {
        Commands::Generate { .. } => commands::handle_generate(connect().await?, &config).await,
        Commands::Clean {
            concurrency,
            delete_namespaces,
            ..
        } => commands::handle_clean(connect().await?, &config, *concurrency, *delete_namespaces).await,
        Commands::Scale { .. } => {
            commands::handle_measure(connect().await?, &config, MeasureMode::ColdStart).await
        }
        Commands::Load { .. } => {
            commands::handle_measure(connect().await?, &config, MeasureMode::Sustained).await
        }
        Commands::Config { config_cmd } => match config_cmd {
            ConfigCommands::Sample => commands::handle_config_sample(),
            ConfigCommands::Validate { config_file } => commands::handle_config_validate(config_file),
            ConfigCommands::Show => commands::handle_config_show(&config),
        },
    }
}

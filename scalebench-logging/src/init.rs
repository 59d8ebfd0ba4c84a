use anyhow::Result;
use scalebench_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Parse a filter, falling back to `RUST_LOG` and then plain `info`
pub fn build_env_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_new(filter)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber described by `config`.
///
/// Events go to stderr so stdout stays free for report rows. Only the first
/// call installs anything.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(&config.filter()))
        .with_writer(std::io::stderr)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Subscriber already installed, keeping the first one");
    }

    Ok(())
}

//! Structured logging for xcode-arch
//!
//! Installs a `tracing` subscriber that writes compact log lines to stderr,
//! leaving stdout for the tool's own output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging
///
/// `RUST_LOG` takes precedence over `config.log_level`.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| anyhow::anyhow!("Invalid log level {:?}: {}", config.log_level, e))?;

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number)
            .without_time()
            .compact(),
    );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.log_level,
        "Logging initialized"
    );

    Ok(())
}

/// Raise a base level by the number of `-v` flags given
pub fn level_for_verbosity(base: &str, verbose: u8) -> String {
    match verbose {
        0 => base.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub show_target: bool,
    pub show_file: bool,
    pub show_line_number: bool,
}

impl TelemetryConfig {
    /// Configuration for a given level, with source locations shown at trace level
    pub fn with_level(log_level: impl Into<String>) -> Self {
        let log_level = log_level.into();
        let detailed = log_level == "trace";
        Self {
            log_level,
            show_target: detailed,
            show_file: detailed,
            show_line_number: detailed,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::with_level("warn")
    }
}

use color_eyre::Report;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for console output
    pub console_level: Level,
    /// Whether to enable JSON formatted logs for structured output
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { console_level: Level::INFO, json_format: false }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("CUBISM_LOG_LEVEL")
            && let Ok(parsed_level) = level.parse::<Level>()
        {
            config.console_level = parsed_level;
        }

        // Enable JSON format for structured logging
        if std::env::var("CUBISM_JSON_LOGS").is_ok() {
            config.json_format = true;
        }

        config
    }
}

/// Initialize the logging system with the given configuration. `RUST_LOG`
/// directives, when set, refine the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Report> {
    let filter = EnvFilter::builder()
        .with_default_directive(config.console_level.into())
        .from_env_lossy();

    let console_layer = if config.json_format {
        fmt::layer().json().with_filter(filter).boxed()
    } else {
        fmt::layer()
            .with_target(false) // Hide module paths for cleaner console output
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry().with(console_layer).try_init()?;
    Ok(())
}

//! Tracing subscriber setup

use std::env;
use std::io;

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    #[must_use]
    pub fn from_str_or_default(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl From<&LoggingConfig> for LoggingSettings {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            format: LogFormat::from_str_or_default(&config.format),
        }
    }
}

impl LoggingSettings {
    /// Build the filter; `RUST_LOG` wins over the configured level
    fn filter(&self) -> EnvFilter {
        let base = env::var("RUST_LOG").map_or_else(
            |_| EnvFilter::new(format!("warn,daytrip={}", self.level)),
            EnvFilter::new,
        );

        // HTTP internals are noisy at debug level
        base.add_directive(
            "hyper=warn"
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        )
        .add_directive(
            "reqwest=warn"
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        )
        .add_directive(
            "tower_http=info"
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        )
    }

    /// Install the global subscriber. Logs go to stderr so stdout stays clean for
    /// CLI output.
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.filter());

        let installed = match self.format {
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_writer(io::stderr)
                        .json(),
                )
                .try_init(),
            LogFormat::Pretty => registry
                .with(fmt::layer().with_target(true).with_writer(io::stderr))
                .try_init(),
        };
        installed.map_err(|e| anyhow!("Failed to initialize logging: {e}"))
    }
}

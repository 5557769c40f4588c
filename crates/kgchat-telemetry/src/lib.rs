//! Logging setup shared by the kgchat binary and tests.
//!
//! Everything is written to stderr so diagnostics never interleave with the
//! chat transcript on stdout.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "kgchat_graph" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// JSON lines instead of the compact format.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level '{0}'")]
    InvalidLevel(String),
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

impl TelemetryConfig {
    /// Build a config from string levels as they appear in settings files.
    pub fn from_levels<'a>(
        level: &str,
        modules: impl IntoIterator<Item = (&'a String, &'a String)>,
        json: bool,
    ) -> Result<Self, TelemetryError> {
        let log_level = parse_level(level)?;
        let module_levels = modules
            .into_iter()
            .map(|(module, lvl)| parse_level(lvl).map(|l| (module.clone(), l)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            log_level,
            module_levels,
            json,
        })
    }

    /// The filter directive string used when RUST_LOG is not set.
    pub fn directives(&self) -> String {
        let mut filter_str = self.log_level.to_string().to_lowercase();
        for (module, level) in &self.module_levels {
            filter_str.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
        }
        filter_str
    }
}

fn parse_level(raw: &str) -> Result<Level, TelemetryError> {
    Level::from_str(raw.trim()).map_err(|_| TelemetryError::InvalidLevel(raw.to_string()))
}

/// Initialize the global subscriber. Call once at startup.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))
}

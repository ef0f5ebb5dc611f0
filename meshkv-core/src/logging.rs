//! Logging subsystem for meshkv
//!
//! Unified logging over the `tracing` crate. The engine itself only emits
//! events (merge decisions at debug, link lifecycle at info, send failures
//! at warn); hosts call the init functions here or install their own
//! subscriber.

use std::fmt;
use thiserror::Error;
use tracing_subscriber::{fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Errors that can occur in the logging subsystem
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to install the subscriber (usually: already initialized)
    #[error("failed to initialize logging: {0}")]
    InitializationFailed(String),
}

/// Severity level for log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the logging subsystem
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Minimum level to display (overridden by RUST_LOG when set)
    pub level: LogLevel,
    /// Emit JSON-formatted lines instead of human-readable ones
    pub json_format: bool,
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        LogConfig { level, ..Default::default() }
    }

    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }
}

/// Initialize logging with defaults (info level, human-readable output)
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::default())
}

/// Initialize logging with an explicit configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    if config.json_format {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer::layer().json())
            .try_init()
            .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer::layer())
            .try_init()
            .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
    }
}

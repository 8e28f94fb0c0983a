//! Logging setup for the now-playing daemon
//!
//! Wraps `tracing-subscriber` so the binary and the integration tests pick
//! a consistent output format with one call.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber installed
    Silent,
    /// Compact stderr output for local runs
    Development,
    /// Verbose diagnostics with source locations
    Debug,
    /// JSON lines for log shippers
    Production,
}

impl LoggingMode {
    fn default_level(self) -> &'static str {
        match self {
            LoggingMode::Silent => "off",
            LoggingMode::Development | LoggingMode::Production => "info",
            LoggingMode::Debug => "debug",
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid environment variable: {0}")]
    InvalidEnv(String),
}

/// Initialize logging with the specified mode
///
/// # Environment Variables
///
/// - `NOWPLAYING_LOG_LEVEL`: Override the filter (e.g. `info,nowplaying_core=debug`)
/// - `RUST_LOG`: Used when `NOWPLAYING_LOG_LEVEL` is unset
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = create_env_filter(mode.default_level())?;

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => Registry::default()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .with(filter)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Debug => Registry::default()
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Production => Registry::default()
            .with(fmt::layer().json().with_current_span(false))
            .with(filter)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
    }
}

/// Parse a mode name as accepted by `NOWPLAYING_LOG_MODE`
pub fn parse_mode(value: &str) -> Result<LoggingMode, LoggingError> {
    match value.to_ascii_lowercase().as_str() {
        "silent" => Ok(LoggingMode::Silent),
        "development" | "dev" => Ok(LoggingMode::Development),
        "debug" => Ok(LoggingMode::Debug),
        "production" | "json" => Ok(LoggingMode::Production),
        other => Err(LoggingError::InvalidEnv(format!(
            "NOWPLAYING_LOG_MODE={other}"
        ))),
    }
}

/// Initialize logging from `NOWPLAYING_LOG_MODE`
///
/// Falls back to `default` when the variable is unset.
pub fn init_logging_from_env(default: LoggingMode) -> Result<(), LoggingError> {
    let mode = match std::env::var("NOWPLAYING_LOG_MODE") {
        Ok(value) => parse_mode(&value)?,
        Err(_) => default,
    };

    init_logging(mode)
}

/// Create an environment filter with fallback to default level
fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var("NOWPLAYING_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&directives)
        .map_err(|e| LoggingError::InvalidEnv(format!("{directives}: {e}")))
}

/// Check if logging has been initialized
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

/// Shorthand for `init_logging(LoggingMode::Silent)`
pub fn init_silent() -> Result<(), LoggingError> {
    init_logging(LoggingMode::Silent)
}

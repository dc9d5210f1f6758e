//! Structured logging setup for kdeploy
//!
//! Initialization and configuration for structured logging via the `tracing`
//! ecosystem. Supports pretty console output (default) or JSON, with runtime
//! configuration through `KDEPLOY_LOG_LEVEL`, `KDEPLOY_LOG_JSON` and the
//! standard `RUST_LOG` filter. Initialization is one-shot; later calls are
//! ignored.
//!
//! # Example
//!
//! ```no_run
//! use kdeploy::util::logging;
//!
//! logging::init_from_env();
//!
//! use tracing::info;
//! info!("deployment run starting");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format (for structured logging in production)
    pub use_json: bool,

    /// Include the module target (e.g., kdeploy::cluster) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Creates a logging configuration with the specified level
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with full metadata, for running under log collectors.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    /// Pretty debug-level console output.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

/// Parses a log level from a string, defaulting to INFO on anything
/// unrecognized.
///
/// # Example
///
/// ```
/// use kdeploy::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("INFO"), Level::INFO);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Initializes the logging system with the provided configuration.
///
/// Can only be called once; subsequent calls are ignored. `RUST_LOG` always
/// takes precedence over the configured level.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env()
            .add_directive(format!("kdeploy={}", config.level).parse().unwrap());

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        }
    });
}

/// Initializes logging with default configuration
pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Initializes logging from `KDEPLOY_LOG_LEVEL` and `KDEPLOY_LOG_JSON`,
/// falling back to defaults when unset.
pub fn init_from_env() {
    let level_str = env::var("KDEPLOY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let level = parse_level(&level_str);

    let use_json = env::var("KDEPLOY_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    let config = LoggingConfig {
        level,
        use_json,
        ..Default::default()
    };

    init_logging(config);
}

/// Initializes logging at the given level string.
pub fn with_level(level_str: &str) {
    let level = parse_level(level_str);
    init_logging(LoggingConfig::with_level(level));
}

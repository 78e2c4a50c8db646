//! Structured logging setup
//!
//! Logs go to stderr through a `tracing` subscriber so stdout stays reserved
//! for user-facing output. `RUST_LOG` directives are honoured on top of the
//! configured level; without it, HTTP client internals are capped at `warn`.
//!
//! # Example
//!
//! ```no_run
//! use svcprov::util::logging;
//! use tracing::info;
//!
//! // With environment: SVCPROV_LOG_LEVEL=debug SVCPROV_LOG_JSON=true
//! logging::init_from_env();
//!
//! info!(service = "db", "Provisioning started");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Crates whose logs are capped at `warn` unless `RUST_LOG` says otherwise
const NOISY_CRATES: &[&str] = &["h2", "hyper", "hyper_util", "reqwest"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for svcprov's own events
    pub level: Level,

    /// Emit one JSON object per event
    pub use_json: bool,

    /// Include the module target (e.g. svcprov::pipeline) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

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
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with location and thread metadata, for log shipping
    pub fn structured() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = format!("svcprov={}", self.level).parse() {
            filter = filter.add_directive(directive);
        }

        if env::var("RUST_LOG").is_err() {
            for krate in NOISY_CRATES {
                if let Ok(directive) = format!("{}=warn", krate).parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        filter
    }
}

/// Parses a log level, case-insensitively
///
/// Unknown names fall back to `INFO` with a warning on stderr.
///
/// ```
/// use svcprov::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
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

/// Installs the global subscriber; only the first call has any effect
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.filter();

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
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
                        .with_writer(std::io::stderr)
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

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Reads `SVCPROV_LOG_LEVEL` and `SVCPROV_LOG_JSON`
pub fn init_from_env() {
    init_logging(config_from_env());
}

fn config_from_env() -> LoggingConfig {
    let level = env::var("SVCPROV_LOG_LEVEL")
        .map(|l| parse_level(&l))
        .unwrap_or(Level::INFO);

    let use_json = env::var("SVCPROV_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    LoggingConfig {
        level,
        use_json,
        ..Default::default()
    }
}

use std::str::FromStr;

use tracing::span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_log_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level `{}`", other)),
        }
    }
}

pub struct Logger;

impl Logger {
    /// Initialize the global subscriber. Logs go to stderr; stdout is kept for results.
    pub fn init(level: LogLevel) {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level.to_log_level())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Run `f` inside an INFO span named after the command being executed.
    pub fn with_span<T>(name: &str, f: impl FnOnce() -> T) -> T {
        let span = span!(tracing::Level::INFO, "command", name);
        let _guard = span.enter();
        f()
    }
}

/// Initialise logging from a level name, falling back to `info` for unknown names.
pub fn setup_logger(level: &str) {
    let level = level.parse().unwrap_or_else(|e: String| {
        eprintln!("{}; using info", e);
        LogLevel::Info
    });
    Logger::init(level);
}

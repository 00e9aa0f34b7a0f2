//! Tracing subscriber setup for the `faultline` binary.
//!
//! Logs go to stderr so stdout stays clean for classification output.
//! Filter precedence: `RUST_LOG`, then `FAULTLINE_LOG`, then the level
//! derived from the command line.

use std::env;

use tracing_subscriber::{fmt, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Default: only truncations and reports show up.
    #[default]
    Warn,
    Error,
    Off,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl From<u8> for LogLevel {
    /// Convert verbosity count to log level.
    /// 0 = Warn, 1 = Info, 2 = Debug, 3+ = Trace
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub with_timestamps: bool,
    pub with_target: bool,
    pub with_ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            with_timestamps: true,
            with_target: true,
            with_ansi: true,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.with_timestamps = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.with_ansi = enabled;
        self
    }

    /// Configuration from a `-v` count; `quiet` wins over any verbosity.
    pub fn from_verbosity(verbosity: u8, quiet: bool) -> Self {
        let level = if quiet {
            LogLevel::Error
        } else {
            LogLevel::from(verbosity)
        };
        Self::default().with_level(level)
    }

    fn filter(&self) -> EnvFilter {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }

        let from_app_env = env::var("FAULTLINE_LOG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .and_then(|value| EnvFilter::try_new(value).ok());

        from_app_env.unwrap_or_else(|| EnvFilter::new(self.level.directive()))
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(config: LoggingConfig) {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(config.filter())
        .with_writer(std::io::stderr)
        .with_target(config.with_target)
        .with_ansi(config.with_ansi);

    // A subscriber may already be installed, e.g. by an embedding application.
    let _ = if config.with_timestamps {
        subscriber.try_init()
    } else {
        subscriber.without_time().try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(LogLevel::from(0), LogLevel::Warn);
        assert_eq!(LogLevel::from(1), LogLevel::Info);
        assert_eq!(LogLevel::from(2), LogLevel::Debug);
        assert_eq!(LogLevel::from(9), LogLevel::Trace);
    }

    #[test]
    fn test_quiet_overrides_verbosity() {
        let config = LoggingConfig::from_verbosity(3, true);
        assert_eq!(config.level, LogLevel::Error);
    }

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::new()
            .with_level(LogLevel::Debug)
            .with_timestamps(false)
            .with_target(false)
            .with_ansi(false);

        assert_eq!(config.level, LogLevel::Debug);
        assert!(!config.with_timestamps);
        assert!(!config.with_target);
        assert!(!config.with_ansi);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(LoggingConfig::new().with_level(LogLevel::Off));
        init_logging(LoggingConfig::new().with_level(LogLevel::Off));
    }
}

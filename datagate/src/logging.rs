//! Logging configuration and setup for datagate.

use tracing::Level;

/// Configuration for datagate's tracing setup.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level for the application
    pub level: Level,
    /// Log level for datagate components specifically
    pub gate_level: Level,
    /// Whether to use JSON output format
    pub json_format: bool,
    /// Environment filter override
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            gate_level: Level::DEBUG,
            json_format: false,
            env_filter: None,
        }
    }
}

impl LogConfig {
    /// Creates a configuration for production use.
    pub fn production() -> Self {
        Self {
            level: Level::WARN,
            gate_level: Level::INFO,
            json_format: true,
            env_filter: None,
        }
    }

    /// Creates a configuration for development use.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            gate_level: Level::DEBUG,
            json_format: false,
            env_filter: None,
        }
    }

    /// Sets the log level for the application.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets whether to use JSON output format.
    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    /// Sets a custom environment filter.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Builds the environment filter string.
    pub fn env_filter(&self) -> String {
        if let Some(ref filter) = self.env_filter {
            filter.clone()
        } else {
            format!(
                "{},datagate={}",
                self.level.as_str().to_lowercase(),
                self.gate_level.as_str().to_lowercase()
            )
        }
    }
}

/// Initializes tracing with the given configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use datagate::logging::{init_logging, LogConfig};
///
/// init_logging(LogConfig::default()).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

    let fmt_layer = if config.json_format {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_env_filter() {
        let config = LogConfig::default();
        assert_eq!(config.env_filter(), "info,datagate=debug");
    }

    #[test]
    fn test_production_config() {
        let config = LogConfig::production();
        assert_eq!(config.level, Level::WARN);
        assert!(config.json_format);
    }

    #[test]
    fn test_custom_filter_wins() {
        let config = LogConfig::default().with_env_filter("warn,datagate=trace");
        assert_eq!(config.env_filter(), "warn,datagate=trace");
    }
}

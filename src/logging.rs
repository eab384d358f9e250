//! Tracing subscriber setup.
//!
//! The engines only emit `tracing` events; nothing is printed unless the host installs a
//! subscriber. Hosts without their own can call [`init_logging`]:
//!
//! ```no_run
//! use ironpix::logging::{LogConfig, init_logging};
//!
//! let config = LogConfig::from_env()?;
//! init_logging(&config)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Environment variables read by [`LogConfig::from_env`]:
//!
//! - `IRONPIX_LOG_LEVEL`: `trace`, `debug`, `info`, `warn` or `error`
//! - `IRONPIX_LOG_FORMAT`: `text` or `json`
//! - `IRONPIX_LOG_FILTER`: extra directives such as `ironpix::fetch=trace`

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LEVEL_ENV: &str = "IRONPIX_LOG_LEVEL";
pub const FORMAT_ENV: &str = "IRONPIX_LOG_FORMAT";
pub const FILTER_ENV: &str = "IRONPIX_LOG_FILTER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(anyhow!("invalid log level: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(anyhow!("invalid log format: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Comma-separated filter directives added on top of `level`.
    pub filter_directives: Option<String>,
    pub include_thread_names: bool,
}

impl LogConfig {
    #[must_use]
    pub fn new(level: LogLevel, format: LogFormat) -> Self {
        Self {
            level,
            format,
            ..Self::default()
        }
    }

    /// Reads the configuration from `IRONPIX_LOG_*` variables; unset ones keep defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a level or format value is not recognized.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(level) = std::env::var(LEVEL_ENV) {
            config.level = level.parse().with_context(|| format!("reading {LEVEL_ENV}"))?;
        }
        if let Ok(format) = std::env::var(FORMAT_ENV) {
            config.format = format.parse().with_context(|| format!("reading {FORMAT_ENV}"))?;
        }
        if let Ok(filter) = std::env::var(FILTER_ENV) {
            config.filter_directives = Some(filter);
        }
        Ok(config)
    }

    /// Builds the `EnvFilter` for this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a filter directive does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::default().add_directive(self.level.to_tracing_level().into());
        if let Some(directives) = &self.filter_directives {
            for directive in directives.split(',').filter(|d| !d.trim().is_empty()) {
                filter = filter.add_directive(
                    directive
                        .trim()
                        .parse()
                        .with_context(|| format!("invalid filter directive '{directive}'"))?,
                );
            }
        }
        Ok(filter)
    }
}

/// Installs a global stderr subscriber.
///
/// Returns `Ok(false)` if a global subscriber was already installed, so tests and
/// embedding hosts may call this more than once.
///
/// # Errors
///
/// Returns an error if a filter directive does not parse.
pub fn init_logging(config: &LogConfig) -> Result<bool> {
    let filter = config.env_filter()?;
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(config.include_thread_names);

    let installed = match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init(),
    };
    Ok(installed.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_and_format() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" json ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("loud".parse::<LogLevel>().is_err());
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_bad_directive_is_rejected() {
        let config = LogConfig {
            filter_directives: Some("ironpix=notalevel".into()),
            ..LogConfig::default()
        };
        assert!(config.env_filter().is_err());
    }

    #[test]
    fn test_repeated_init_is_tolerated() {
        let config = LogConfig::new(LogLevel::Debug, LogFormat::Text);
        init_logging(&config).unwrap();
        assert!(!init_logging(&config).unwrap());
    }
}

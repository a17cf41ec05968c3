//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::{
    default_broadcast_capacity, default_idle_timeout_secs, default_listen_address,
    default_mailbox_capacity, default_max_line_length,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server-wide options.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Per-session queueing and timeout limits.
    #[serde(default)]
    pub session: SessionConfig,
    /// Log output options.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server-wide options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Prometheus metrics HTTP port. Absent or 0 disables the endpoint.
    pub metrics_port: Option<u16>,
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_address")]
    pub address: std::net::SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
        }
    }
}

/// Session limits as written in the config file.
///
/// Converted into [`SessionSettings`] before it reaches the runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Seconds without input before a session is evicted (default: 10).
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Outbound messages queued per session before deliveries are dropped (default: 10).
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Messages queued on the shared broadcast channel (default: 10).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,

    /// How long the router waits on a full mailbox before dropping, in
    /// milliseconds. 0 drops immediately (default: 0).
    #[serde(default)]
    pub delivery_timeout_ms: u64,

    /// Longest accepted input line in bytes (default: 1024).
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            mailbox_capacity: default_mailbox_capacity(),
            broadcast_capacity: default_broadcast_capacity(),
            delivery_timeout_ms: 0,
            max_line_length: default_max_line_length(),
        }
    }
}

/// Runtime session limits with durations already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub idle_timeout: Duration,
    pub mailbox_capacity: usize,
    pub broadcast_capacity: usize,
    /// `None` means drop-on-full.
    pub delivery_timeout: Option<Duration>,
    pub max_line_length: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionConfig::default().settings()
    }
}

impl SessionConfig {
    /// Resolve the runtime settings.
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            mailbox_capacity: self.mailbox_capacity,
            broadcast_capacity: self.broadcast_capacity,
            delivery_timeout: (self.delivery_timeout_ms > 0)
                .then(|| Duration::from_millis(self.delivery_timeout_ms)),
            max_line_length: self.max_line_length,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Log output options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // ========================================================================
    // SessionConfig tests
    // ========================================================================

    #[test]
    fn session_defaults_match_reference_behavior() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout_secs, 10);
        assert_eq!(config.mailbox_capacity, 10);
        assert_eq!(config.broadcast_capacity, 10);
        assert_eq!(config.delivery_timeout_ms, 0);
        assert_eq!(config.max_line_length, 1024);
    }

    #[test]
    fn zero_delivery_timeout_means_drop_on_full() {
        let settings = SessionConfig::default().settings();
        assert_eq!(settings.delivery_timeout, None);
        assert_eq!(settings.idle_timeout, Duration::from_secs(10));
    }

    #[test]
    fn nonzero_delivery_timeout_is_resolved() {
        let config = SessionConfig {
            delivery_timeout_ms: 250,
            ..SessionConfig::default()
        };
        assert_eq!(
            config.settings().delivery_timeout,
            Some(Duration::from_millis(250))
        );
    }

    // ========================================================================
    // Loading
    // ========================================================================

    #[test]
    fn empty_file_is_a_valid_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.listen.address.port(), 8080);
        assert_eq!(config.server.metrics_port, None);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn load_reads_all_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
metrics_port = 9191

[listen]
address = "127.0.0.1:7000"

[session]
idle_timeout_secs = 30
mailbox_capacity = 64
delivery_timeout_ms = 50

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.metrics_port, Some(9191));
        assert_eq!(config.listen.address.port(), 7000);
        assert_eq!(config.session.idle_timeout_secs, 30);
        assert_eq!(config.session.mailbox_capacity, 64);
        assert_eq!(config.session.broadcast_capacity, 10);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nidle_timeout_secs = \"soon\"").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/huddle.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}

//! Configuration loading and typed config structures for Scorefeed.
//!
//! The configuration lives in `scorefeed-config.yaml` next to the binary's
//! working directory. This module defines strongly-typed structs that mirror
//! the YAML structure and a loader that reads it. Every field has a default,
//! so an empty or missing file is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScorefeedConfig {
    /// Upstream feed location and polling cadence.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Observer HTTP server binding.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Run bounds.
    #[serde(default)]
    pub run: RunConfig,
}

impl ScorefeedConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `FEED_BASE_URL` overrides `feed.base_url`
    /// - `POLL_INTERVAL_MS` overrides `feed.poll_interval_ms`
    /// - `OBSERVER_PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    ///
    /// Unparseable numeric overrides are ignored and the YAML value kept.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FEED_BASE_URL") {
            self.feed.base_url = val;
        }
        if let Some(ms) = std::env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.feed.poll_interval_ms = ms;
        }
        if let Some(port) = std::env::var("OBSERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.observer.port = port;
        }
    }
}

/// Upstream feed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// Base address of the upstream feed (scheme, host, port).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the mapping endpoint, relative to `base_url`.
    #[serde(default = "default_mappings_path")]
    pub mappings_path: String,

    /// Path of the snapshot endpoint, relative to `base_url`.
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Milliseconds between poll cycles.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl FeedConfig {
    /// Full URL of the mapping endpoint.
    pub fn mappings_url(&self) -> String {
        join_url(&self.base_url, &self.mappings_path)
    }

    /// Full URL of the snapshot endpoint.
    pub fn state_url(&self) -> String {
        join_url(&self.base_url, &self.state_path)
    }

    /// Request timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mappings_path: default_mappings_path(),
            state_path: default_state_path(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Observer HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Address to bind.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Run bounds for the poll loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Stop after this many poll cycles (0 = unlimited).
    #[serde(default)]
    pub max_cycles: u64,
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn default_base_url() -> String {
    "http://localhost:3000".to_owned()
}

fn default_mappings_path() -> String {
    "/api/mappings".to_owned()
}

fn default_state_path() -> String {
    "/api/state".to_owned()
}

const fn default_poll_interval_ms() -> u64 {
    5000
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    4000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ScorefeedConfig::default();
        assert_eq!(config.feed.poll_interval_ms, 5000);
        assert_eq!(config.observer.port, 4000);
        assert_eq!(config.run.max_cycles, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
feed:
  base_url: "http://feed.test:3100"
  mappings_path: "/v2/mappings"
  state_path: "/v2/state"
  poll_interval_ms: 2500
  request_timeout_ms: 1500

observer:
  host: "127.0.0.1"
  port: 9090

logging:
  level: "debug"

run:
  max_cycles: 12
"#;

        let config = ScorefeedConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.feed.state_path, "/v2/state");
        assert_eq!(config.feed.request_timeout(), Duration::from_millis(1500));
        assert_eq!(config.observer.host, "127.0.0.1");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.run.max_cycles, 12);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "run:\n  max_cycles: 3\n";
        let config = ScorefeedConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.run.max_cycles, 3);
        assert_eq!(config.feed.mappings_path, "/api/mappings");
    }

    #[test]
    fn parse_empty_yaml() {
        let config = ScorefeedConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn endpoint_urls_join_cleanly() {
        let feed = FeedConfig {
            base_url: "http://localhost:3000/".to_owned(),
            ..FeedConfig::default()
        };
        assert_eq!(feed.mappings_url(), "http://localhost:3000/api/mappings");
        assert_eq!(feed.state_url(), "http://localhost:3000/api/state");
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("scorefeed-config.yaml");
        if path.exists() {
            let config = ScorefeedConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}

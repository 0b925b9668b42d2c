//! Server configuration loading from file and environment variables.

use parley_render::{RenderConfig, RenderError};
use parley_voice::{RelayConfig, VoiceError};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Worker dispatch and result polling.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Local rendering service.
    #[serde(default)]
    pub render: RenderConfig,

    /// Result retention.
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "parley_voice=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// How long stored results are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Results older than this many seconds are deleted. `0` keeps results
    /// forever and disables the retention task.
    #[serde(default)]
    pub max_age_secs: u64,

    /// Seconds between retention sweeps.
    #[serde(default = "default_retention_interval_secs")]
    pub interval_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "parley.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_retention_interval_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 0,
            interval_secs: default_retention_interval_secs(),
        }
    }
}

impl RetentionConfig {
    pub fn is_enabled(&self) -> bool {
        self.max_age_secs > 0
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Retention` if retention is enabled with a zero
    /// sweep interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_enabled() && self.interval_secs == 0 {
            return Err(ConfigError::Retention(
                "interval_secs must be positive when max_age_secs is set".to_string(),
            ));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn runtime_settings(&self) -> parley_db::DbRuntimeSettings {
        parley_db::DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The relay settings are invalid.
    #[error("invalid relay settings: {0}")]
    Relay(#[from] VoiceError),

    /// The render settings are invalid.
    #[error("invalid render settings: {0}")]
    Render(#[from] RenderError),

    #[error("invalid retention settings: {0}")]
    Retention(String),
}

impl Config {
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first section that fails validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relay.validate()?;
        self.render.validate()?;
        self.retention.validate()
    }
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides.
///
/// Environment variable overrides:
/// - `PARLEY_HOST` / `PARLEY_PORT` override `server.host` / `server.port`
/// - `PARLEY_DB_PATH` overrides `database.path`
/// - `PARLEY_LOG_LEVEL` overrides `logging.level`
/// - `PARLEY_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `PARLEY_WEBHOOK_URL` / `PARLEY_RESULT_URL` override the relay endpoints
/// - `PARLEY_CONNECT_TIMEOUT`, `PARLEY_READ_TIMEOUT`, `PARLEY_HTTP_TIMEOUT`,
///   `PARLEY_POLL_INTERVAL`, `PARLEY_TIMEOUT_SECONDS` override the relay
///   durations, in seconds
/// - `PARLEY_MAX_SPEECH_CHARS` overrides `relay.max_speech_chars`
/// - `PARLEY_RENDER_HOST` overrides `render.host`
/// - `PARLEY_RETENTION_SECONDS` overrides `retention.max_age_secs`
///
/// Unparseable numeric overrides are ignored.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `PARLEY_*` overrides read through `lookup`.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    fn parsed<T: std::str::FromStr>(
        lookup: &impl Fn(&str) -> Option<String>,
        key: &str,
    ) -> Option<T> {
        lookup(key).and_then(|value| value.trim().parse().ok())
    }

    if let Some(host) = parsed(&lookup, "PARLEY_HOST") {
        config.server.host = host;
    }
    if let Some(port) = parsed(&lookup, "PARLEY_PORT") {
        config.server.port = port;
    }
    if let Some(db_path) = lookup("PARLEY_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = lookup("PARLEY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("PARLEY_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    if let Some(url) = lookup("PARLEY_WEBHOOK_URL") {
        config.relay.webhook_url = Some(url).filter(|u| !u.trim().is_empty());
    }
    if let Some(url) = lookup("PARLEY_RESULT_URL") {
        config.relay.result_url = Some(url).filter(|u| !u.trim().is_empty());
    }
    if let Some(secs) = parsed(&lookup, "PARLEY_CONNECT_TIMEOUT") {
        config.relay.connect_timeout_secs = secs;
    }
    if let Some(secs) = parsed(&lookup, "PARLEY_READ_TIMEOUT") {
        config.relay.read_timeout_secs = secs;
    }
    if let Some(secs) = parsed(&lookup, "PARLEY_HTTP_TIMEOUT") {
        config.relay.http_timeout_secs = secs;
    }
    if let Some(secs) = parsed(&lookup, "PARLEY_POLL_INTERVAL") {
        config.relay.poll_interval_secs = secs;
    }
    if let Some(secs) = parsed(&lookup, "PARLEY_TIMEOUT_SECONDS") {
        config.relay.timeout_secs = secs;
    }
    if let Some(chars) = parsed(&lookup, "PARLEY_MAX_SPEECH_CHARS") {
        config.relay.max_speech_chars = chars;
    }

    if let Some(host) = lookup("PARLEY_RENDER_HOST") {
        config.render.host = host;
    }
    if let Some(secs) = parsed(&lookup, "PARLEY_RETENTION_SECONDS") {
        config.retention.max_age_secs = secs;
    }
}

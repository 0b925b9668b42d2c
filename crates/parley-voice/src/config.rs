use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::VoiceError;

fn default_connect_timeout_secs() -> f64 {
    5.0
}

fn default_http_timeout_secs() -> f64 {
    10.0
}

fn default_read_timeout_secs() -> f64 {
    10.0
}

fn default_poll_interval_secs() -> f64 {
    0.5
}

fn default_timeout_secs() -> f64 {
    20.0
}

fn default_max_speech_chars() -> usize {
    7000
}

/// Settings for relaying a spoken question to the worker and waiting for the
/// answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Worker webhook that receives `{request_id, prompt}`.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Base URL of the result read endpoint (`GET ?request_id=`). When unset,
    /// the server polls its own correlation store directly.
    #[serde(default)]
    pub result_url: Option<String>,
    /// Connect timeout for every outbound call, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: f64,
    /// Total timeout for the dispatch call, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: f64,
    /// Total timeout for a single poll attempt, in seconds.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: f64,
    /// Fixed sleep between poll attempts, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f64,
    /// Overall deadline for one spoken turn, measured from dispatch, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    /// Longest answer spoken back, in characters.
    #[serde(default = "default_max_speech_chars")]
    pub max_speech_chars: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            result_url: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
            max_speech_chars: default_max_speech_chars(),
        }
    }
}

impl RelayConfig {
    /// Checks that every duration is a positive, finite number of seconds.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<(), VoiceError> {
        let fields = [
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("http_timeout_secs", self.http_timeout_secs),
            ("read_timeout_secs", self.read_timeout_secs),
            ("poll_interval_secs", self.poll_interval_secs),
            ("timeout_secs", self.timeout_secs),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(VoiceError::Config(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, value
                )));
            }
        }
        if self.max_speech_chars == 0 {
            return Err(VoiceError::Config(
                "max_speech_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        secs(self.connect_timeout_secs, default_connect_timeout_secs())
    }

    pub fn http_timeout(&self) -> Duration {
        secs(self.http_timeout_secs, default_http_timeout_secs())
    }

    pub fn read_timeout(&self) -> Duration {
        secs(self.read_timeout_secs, default_read_timeout_secs())
    }

    pub fn poll_interval(&self) -> Duration {
        secs(self.poll_interval_secs, default_poll_interval_secs())
    }

    pub fn timeout(&self) -> Duration {
        secs(self.timeout_secs, default_timeout_secs())
    }

    /// Builds the pooled HTTP client shared by the dispatcher and the HTTP
    /// result source. Per-request total timeouts are set by each caller.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::Client` if the TLS backend cannot be initialized.
    pub fn build_http_client(&self) -> Result<reqwest::Client, VoiceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout())
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }
}

fn secs(value: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(value)
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or_else(|| Duration::from_secs_f64(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RelayConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.max_speech_chars, 7000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_durations() {
        let config = RelayConfig {
            poll_interval_secs: 0.0,
            ..RelayConfig::default()
        };
        let err = config.validate().expect_err("zero interval should fail");
        assert!(err.to_string().contains("poll_interval_secs"));

        let config = RelayConfig {
            timeout_secs: f64::NAN,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = RelayConfig {
            read_timeout_secs: -1.0,
            ..RelayConfig::default()
        };
        assert_eq!(config.read_timeout(), Duration::from_secs(10));
    }
}

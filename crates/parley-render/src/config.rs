use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::RenderError;

fn default_host() -> String {
    "http://127.0.0.1:8188".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_wait_secs() -> u64 {
    15 * 60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_duration_seconds() -> u32 {
    10
}

/// Settings for the local rendering service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Base URL of the rendering service, without a trailing slash.
    #[serde(default = "default_host")]
    pub host: String,
    /// Workflow template file. When unset, the built-in text-to-video
    /// workflow is used.
    #[serde(default)]
    pub workflow_path: Option<PathBuf>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
    /// Total timeout for each submit or status call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Clip length used when a submission does not name one.
    #[serde(default = "default_duration_seconds")]
    pub default_duration_seconds: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            workflow_path: None,
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            default_duration_seconds: default_duration_seconds(),
        }
    }
}

impl RenderConfig {
    /// # Errors
    ///
    /// Returns `RenderError::Config` if the host is not an http(s) URL or a
    /// duration is zero.
    pub fn validate(&self) -> Result<(), RenderError> {
        let url = reqwest::Url::parse(&self.host)
            .map_err(|e| RenderError::Config(format!("invalid render host {:?}: {}", self.host, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RenderError::Config(format!(
                "render host must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.poll_interval_secs == 0 || self.max_wait_secs == 0 || self.request_timeout_secs == 0 {
            return Err(RenderError::Config(
                "render durations must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The host with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

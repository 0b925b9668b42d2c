use crate::config::RelayConfig;
use crate::error::DispatchError;
use parley_types::WorkItem;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::info;

/// Sends work items to the worker's webhook.
///
/// One POST per item, JSON body `{"request_id", "prompt"}`. The worker's
/// status is returned as-is; interpreting it is the caller's job. There are
/// no retries.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    webhook_url: Option<String>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(client: reqwest::Client, config: &RelayConfig) -> Self {
        Self {
            client,
            webhook_url: config.webhook_url.clone(),
            timeout: config.http_timeout(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Posts `item` to the worker and returns the status it answered with.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Transport` if no status was received (DNS,
    /// connect, or timeout failure) and `DispatchError::NotConfigured` if no
    /// webhook URL is set.
    pub async fn dispatch(&self, item: &WorkItem) -> Result<StatusCode, DispatchError> {
        let url = self
            .webhook_url
            .as_deref()
            .ok_or(DispatchError::NotConfigured)?;

        info!(request_id = %item.request_id, "dispatching work item to worker");

        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(item)
            .send()
            .await?;

        let status = response.status();
        info!(
            request_id = %item.request_id,
            status = status.as_u16(),
            "worker webhook responded"
        );
        Ok(status)
    }
}

/// Whether the worker refused the item. Any status from 400 up counts,
/// including non-standard codes above 599.
pub(crate) fn is_rejection(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

use parley_correlation::{PollOutcome, Poller, ReadError, ResultSource};
use parley_types::RequestId;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::status::JobStatus;

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    prompt_id: Option<String>,
}

/// HTTP client for the local rendering service.
#[derive(Debug, Clone)]
pub struct RenderClient {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    poll_interval: Duration,
    max_wait: Duration,
}

impl RenderClient {
    pub fn new(client: reqwest::Client, config: &RenderConfig) -> Self {
        Self {
            client,
            base_url: config.base_url().to_string(),
            request_timeout: config.request_timeout(),
            poll_interval: config.poll_interval(),
            max_wait: config.max_wait(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queues `workflow` and returns the service's job id.
    ///
    /// # Errors
    ///
    /// `Transport` or `Status` if the service did not accept the job,
    /// `Decode` if its reply was not JSON, and `MissingPromptId` if the reply
    /// carried no job id.
    pub async fn submit(&self, workflow: &Value) -> Result<String, RenderError> {
        let url = format!("{}/prompt", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&json!({ "prompt": workflow }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| RenderError::Decode(e.to_string()))?;

        let prompt_id = body
            .prompt_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(RenderError::MissingPromptId)?;
        info!(prompt_id = %prompt_id, "render job submitted");
        Ok(prompt_id)
    }

    /// Looks up a job in the service's history.
    pub async fn check(&self, prompt_id: &str) -> Result<JobStatus, RenderError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| RenderError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| RenderError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["history", prompt_id]);

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let history: Value = response
            .json()
            .await
            .map_err(|e| RenderError::Decode(e.to_string()))?;

        let job = JobStatus::from_history(&self.base_url, prompt_id, &history)?;
        debug!(prompt_id = %prompt_id, completed = job.is_completed(), "render job checked");
        Ok(job)
    }

    /// Polls a job until it completes or the configured max wait passes.
    ///
    /// The ready value is the job's download URL, if it produced a file.
    pub async fn wait(&self, prompt_id: &RequestId) -> PollOutcome<Option<String>> {
        let poller = Poller::new(self.clone(), self.poll_interval);
        poller.poll(prompt_id, Instant::now() + self.max_wait).await
    }
}

impl ResultSource for RenderClient {
    type Output = Option<String>;

    async fn fetch(&self, request_id: &RequestId) -> Result<Option<Option<String>>, ReadError> {
        match self.check(request_id.as_str()).await {
            Ok(JobStatus::Completed { download_url }) => Ok(Some(download_url)),
            Ok(JobStatus::Processing) => Ok(None),
            Err(RenderError::Status(code)) => Err(ReadError::Status(code)),
            Err(RenderError::Decode(e)) => Err(ReadError::Decode(e)),
            Err(e) => Err(ReadError::Transport(e.to_string())),
        }
    }
}

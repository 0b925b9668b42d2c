use tracing::warn;

use crate::client::RenderClient;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::status::JobReport;
use crate::template::{RenderRequest, WorkflowTemplate};

const CHECK_PREFIX: &str = "check ";

/// Chat-tool front end over the render client.
///
/// One entry point: `check <id>` reports on a job, anything else is treated
/// as a prompt and submitted. Failures come back as `error` reports rather
/// than `Err`.
#[derive(Debug, Clone)]
pub struct RenderTool {
    client: RenderClient,
    template: WorkflowTemplate,
    default_duration_seconds: u32,
}

impl RenderTool {
    pub fn new(client: RenderClient, template: WorkflowTemplate, default_duration_seconds: u32) -> Self {
        Self {
            client,
            template,
            default_duration_seconds,
        }
    }

    /// Builds a tool from config, loading `workflow_path` or falling back to
    /// the bundled text-to-video workflow.
    pub fn from_config(http: reqwest::Client, config: &RenderConfig) -> Result<Self, RenderError> {
        let template = match &config.workflow_path {
            Some(path) => WorkflowTemplate::load(path)?,
            None => WorkflowTemplate::text_to_video()?,
        };
        Ok(Self::new(
            RenderClient::new(http, config),
            template,
            config.default_duration_seconds,
        ))
    }

    pub fn client(&self) -> &RenderClient {
        &self.client
    }

    /// Fills the template from `request` and queues it.
    pub async fn submit(&self, request: &RenderRequest) -> Result<String, RenderError> {
        let workflow = self.template.instantiate(request, self.default_duration_seconds);
        self.client.submit(&workflow).await
    }

    pub async fn run(
        &self,
        input: &str,
        negative_prompt: Option<&str>,
        duration_seconds: Option<u32>,
    ) -> JobReport {
        let input = input.trim();
        if let Some(prompt_id) = strip_check(input) {
            return self.check(prompt_id).await;
        }

        let request = RenderRequest {
            prompt: input.to_string(),
            negative_prompt: negative_prompt.map(str::to_string),
            duration_seconds,
        };
        match self.submit(&request).await {
            Ok(prompt_id) => JobReport::submitted(prompt_id),
            Err(e) => {
                warn!(error = %e, "render submission failed");
                JobReport::error(None, e.to_string())
            }
        }
    }

    async fn check(&self, prompt_id: &str) -> JobReport {
        match self.client.check(prompt_id).await {
            Ok(status) => JobReport::for_status(prompt_id, status),
            Err(e) => {
                warn!(prompt_id = %prompt_id, error = %e, "render status check failed");
                JobReport::error(
                    Some(prompt_id.to_string()),
                    format!("Failed to query render history: {}", e),
                )
            }
        }
    }
}

/// Returns the job id from a `check <id>` command, matched case-insensitively.
fn strip_check(input: &str) -> Option<&str> {
    let head = input.get(..CHECK_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(CHECK_PREFIX) {
        return None;
    }
    let id = input[CHECK_PREFIX.len()..].trim();
    (!id.is_empty()).then_some(id)
}

use serde::Serialize;
use serde_json::Value;

use crate::error::RenderError;

/// Output lists checked on each node, most preferred first.
const OUTPUT_KINDS: &[&str] = &["videos", "gifs", "images"];

/// Where a submitted job stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Processing,
    /// Finished. `download_url` is unset when the job produced no file.
    Completed { download_url: Option<String> },
}

impl JobStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Reads a job's status out of a history response.
    ///
    /// The history body is keyed by job id. An absent entry means the job is
    /// still queued. Output nodes are scanned in key order and the first
    /// node holding files wins; within that node videos beat gifs beat
    /// images, and the last listed file is the one returned.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Decode` if a download URL cannot be built from
    /// `base_url`.
    pub fn from_history(base_url: &str, prompt_id: &str, history: &Value) -> Result<Self, RenderError> {
        let Some(entry) = history.get(prompt_id).filter(|e| !e.is_null()) else {
            return Ok(Self::Processing);
        };

        let outputs = entry.get("outputs").and_then(Value::as_object);
        for node in outputs.into_iter().flat_map(|map| map.values()) {
            if let Some(file) = last_output_file(node) {
                let filename = file.get("filename").and_then(Value::as_str).unwrap_or_default();
                let subfolder = file.get("subfolder").and_then(Value::as_str).unwrap_or_default();
                let url = reqwest::Url::parse_with_params(
                    &format!("{}/view", base_url),
                    &[("filename", filename), ("subfolder", subfolder)],
                )
                .map_err(|e| RenderError::Decode(format!("bad download url: {}", e)))?;
                return Ok(Self::Completed {
                    download_url: Some(url.into()),
                });
            }
        }

        let completed = entry
            .pointer("/status/completed")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if completed {
            Ok(Self::Completed { download_url: None })
        } else {
            Ok(Self::Processing)
        }
    }
}

fn last_output_file(node: &Value) -> Option<&Value> {
    OUTPUT_KINDS.iter().find_map(|kind| {
        node.get(*kind)
            .and_then(Value::as_array)
            .and_then(|files| files.last())
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Submitted,
    Processing,
    Completed,
    Error,
}

/// A caller-facing summary of a submit or status call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobReport {
    pub fn submitted(prompt_id: impl Into<String>) -> Self {
        let prompt_id = prompt_id.into();
        Self {
            status: ReportStatus::Submitted,
            message: Some(format!("Submitted successfully. Use `check {}`.", prompt_id)),
            prompt_id: Some(prompt_id),
            download_url: None,
        }
    }

    pub fn for_status(prompt_id: impl Into<String>, status: JobStatus) -> Self {
        let prompt_id = Some(prompt_id.into());
        match status {
            JobStatus::Processing => Self {
                status: ReportStatus::Processing,
                prompt_id,
                download_url: None,
                message: Some("Job still running.".to_string()),
            },
            JobStatus::Completed {
                download_url: Some(url),
            } => Self {
                status: ReportStatus::Completed,
                prompt_id,
                download_url: Some(url),
                message: None,
            },
            JobStatus::Completed { download_url: None } => Self {
                status: ReportStatus::Completed,
                prompt_id,
                download_url: None,
                message: Some("Job completed but no file was attached.".to_string()),
            },
        }
    }

    pub fn error(prompt_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: ReportStatus::Error,
            prompt_id,
            download_url: None,
            message: Some(message.into()),
        }
    }
}

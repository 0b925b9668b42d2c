//! Render job routes.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Path},
    Json,
};
use parley_render::{JobReport, RenderError, RenderRequest};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Request body for `POST /api/render/jobs`.
///
/// Either a prompt for the configured template, or a complete workflow to
/// submit verbatim.
#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub workflow: Option<Value>,
}

/// Request body for `POST /api/render/tool`.
#[derive(Debug, Deserialize)]
pub struct ToolRequest {
    pub input: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

fn upstream(e: RenderError) -> ApiError {
    tracing::warn!(error = %e, "render service call failed");
    ApiError::BadGateway("render service unavailable".to_string())
}

/// Handler for `POST /api/render/jobs`.
pub async fn submit_job_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SubmitJobRequest>,
) -> Result<Json<JobReport>, ApiError> {
    let prompt_id = match payload.workflow {
        Some(workflow) if workflow.is_object() => {
            state.render.client().submit(&workflow).await.map_err(upstream)?
        }
        Some(_) => {
            return Err(ApiError::BadRequest(
                "workflow must be a JSON object".to_string(),
            ))
        }
        None => {
            let prompt = payload
                .prompt
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| ApiError::BadRequest("missing prompt".to_string()))?;
            let request = RenderRequest {
                prompt,
                negative_prompt: payload.negative_prompt,
                duration_seconds: payload.duration_seconds,
            };
            state.render.submit(&request).await.map_err(upstream)?
        }
    };

    Ok(Json(JobReport::submitted(prompt_id)))
}

/// Handler for `GET /api/render/jobs/{promptId}`.
pub async fn get_job_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(prompt_id): Path<String>,
) -> Result<Json<JobReport>, ApiError> {
    let status = state
        .render
        .client()
        .check(&prompt_id)
        .await
        .map_err(upstream)?;
    Ok(Json(JobReport::for_status(prompt_id, status)))
}

/// Handler for `POST /api/render/tool`.
pub async fn run_tool_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ToolRequest>,
) -> Json<JobReport> {
    Json(
        state
            .render
            .run(
                &payload.input,
                payload.negative_prompt.as_deref(),
                payload.duration_seconds,
            )
            .await,
    )
}

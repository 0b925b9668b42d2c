//! Ingress endpoint: workers write results, pollers read them.

use crate::{api::ApiError, AppState};
use axum::{
    body::Bytes,
    extract::{Extension, Query},
    Json,
};
use parley_correlation::{get_result, put_result};
use parley_types::{
    ReadResultQuery, ReadResultResponse, RequestId, WriteResultRequest, WriteResultResponse,
};
use std::sync::Arc;

/// Handler for `POST /api/results`.
///
/// The body is decoded by hand so that malformed JSON gets the same generic
/// 400 as a missing field.
pub async fn write_result_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WriteResultResponse>, ApiError> {
    let payload: WriteResultRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "unparseable result body");
        ApiError::BadRequest("invalid JSON body".to_string())
    })?;

    let request_id = payload
        .request_id
        .clone()
        .and_then(RequestId::parse)
        .ok_or_else(|| ApiError::BadRequest("missing request_id".to_string()))?;

    let text = payload
        .raw_payload()
        .and_then(|raw| state.normalizer.normalize(raw))
        .ok_or_else(|| {
            tracing::warn!(request_id = %request_id, "result payload had no usable text");
            ApiError::BadRequest("missing response".to_string())
        })?;

    let rid = request_id.clone();
    let result = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| format!("db connection failed: {}", e))?;
        put_result(&conn, &rid, &text).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| format!("write task failed: {}", e))
    .and_then(|inner| inner);

    match result {
        Ok(record) => {
            tracing::info!(
                request_id = %record.request_id,
                chars = record.response.chars().count(),
                "stored worker result"
            );
            Ok(Json(WriteResultResponse { ok: true }))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "failed to store result");
            Err(ApiError::WriteFailed("failed to store result".to_string()))
        }
    }
}

/// Handler for `GET /api/results?request_id=`.
pub async fn read_result_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ReadResultQuery>,
) -> Result<Json<ReadResultResponse>, ApiError> {
    let request_id = query
        .request_id
        .and_then(RequestId::parse)
        .ok_or_else(|| ApiError::BadRequest("missing request_id".to_string()))?;

    let rid = request_id.clone();
    let record = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| format!("db connection failed: {}", e))?;
        get_result(&conn, &rid).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| format!("read task failed: {}", e))
    .and_then(|inner| inner)
    .map_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "failed to read result");
        ApiError::InternalServerError("failed to read result".to_string())
    })?;

    Ok(Json(ReadResultResponse {
        response: record.map(|r| r.response),
    }))
}

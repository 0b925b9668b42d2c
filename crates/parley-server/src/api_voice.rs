//! Voice platform webhook.

use crate::{api::ApiError, AppState};
use axum::{body::Bytes, extract::Extension, Json};
use futures_util::FutureExt;
use parley_voice::session::INTERNAL_ERROR;
use parley_voice::{RequestEnvelope, ResponseEnvelope, VoiceReply};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Handler for `POST /api/voice`.
///
/// Every well-formed envelope gets a spoken reply, including failures: a
/// panic inside the turn is caught and answered with a generic apology.
/// Dropping the request (caller hangs up) drops the turn and its poll loop.
pub async fn voice_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let envelope: RequestEnvelope = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "unparseable voice request");
        ApiError::BadRequest("invalid voice request".to_string())
    })?;

    let reply = match AssertUnwindSafe(state.relay.handle(&envelope))
        .catch_unwind()
        .await
    {
        Ok(reply) => reply,
        Err(_) => {
            tracing::error!(kind = %envelope.request.kind, "voice turn panicked");
            VoiceReply::say(INTERNAL_ERROR)
        }
    };

    Ok(Json(reply.into_envelope()))
}

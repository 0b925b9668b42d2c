//! Parley server library logic.

pub mod api;
pub mod api_render;
pub mod api_results;
pub mod api_voice;
pub mod config;
pub mod retention;
pub mod source;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::{Config, ConfigError};
use parley_correlation::Normalizer;
use parley_db::DbPool;
use parley_render::RenderTool;
use parley_voice::{Dispatcher, HttpResultSource, SessionAdapter};
use serde_json::{json, Value};
use source::{RelaySource, StoreResultSource};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Extracts answer text from result writes.
    pub normalizer: Normalizer,
    /// Voice turn orchestration.
    pub relay: Arc<SessionAdapter<RelaySource>>,
    /// Rendering service front end.
    pub render: Arc<RenderTool>,
}

impl AppState {
    /// Wires the relay and render client from `config`.
    ///
    /// The relay polls `relay.result_url` when one is set, and this server's
    /// own store otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a section fails validation, the HTTP client
    /// cannot be built, or the workflow template cannot be loaded.
    pub fn new(pool: DbPool, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let http = config.relay.build_http_client()?;
        let dispatcher = Dispatcher::new(http.clone(), &config.relay);
        let source = match &config.relay.result_url {
            Some(url) => RelaySource::Http(HttpResultSource::new(
                http.clone(),
                url.clone(),
                config.relay.read_timeout(),
            )),
            None => RelaySource::Store(StoreResultSource::new(pool.clone())),
        };
        if !dispatcher.is_configured() {
            tracing::warn!("no worker webhook configured; voice questions will fail");
        }

        let render = RenderTool::from_config(http, &config.render)?;

        Ok(Self {
            pool,
            normalizer: Normalizer::default(),
            relay: Arc::new(SessionAdapter::new(&config.relay, dispatcher, source)),
            render: Arc::new(render),
        })
    }
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/results",
            post(api_results::write_result_handler).get(api_results::read_result_handler),
        )
        .route("/api/voice", post(api_voice::voice_handler))
        .route("/api/render/jobs", post(api_render::submit_job_handler))
        .route(
            "/api/render/jobs/{promptId}",
            get(api_render::get_job_handler),
        )
        .route("/api/render/tool", post(api_render::run_tool_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

//! Application state and HTTP router construction.
//!
//! Used by [HttpServerService](crate::services::http_server::HttpServerService)
//! to build the Axum app.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::services::AudioServer;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub audio_server: Arc<AudioServer>,
}

/// Build the full Axum router: /audio, /healthz and the trace layer.
/// Returns Router<()> (state fully applied) for use with axum::serve.
pub fn build_app(state: AppState) -> Router<()> {
    Router::new()
        .merge(api::health::router())
        .merge(api::audio::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Audio serving endpoint
//!
//! Serves streams registered with the [AudioServer](crate::services::AudioServer)
//! to cast devices.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::app::AppState;
use crate::services::audio_server::ServedAudio;

/// Serve a registered audio stream
///
/// GET /audio/{id}
async fn serve_audio(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<Uuid>() else {
        return (StatusCode::NOT_FOUND, "Audio stream not found").into_response();
    };

    match state.audio_server.take(id) {
        Some(ServedAudio::Redirect(url)) => Redirect::temporary(&url).into_response(),
        Some(ServedAudio::Buffered { content_type, data }) => {
            let headers = [
                (header::CONTENT_TYPE, content_type.to_string()),
                (header::CACHE_CONTROL, "no-cache".to_string()),
            ];
            (StatusCode::OK, headers, data).into_response()
        }
        Some(ServedAudio::Reader {
            content_type,
            reader,
        }) => {
            let body = Body::from_stream(ReaderStream::new(reader));
            let headers = [
                (header::CONTENT_TYPE, content_type.to_string()),
                (header::CACHE_CONTROL, "no-cache".to_string()),
            ];
            (StatusCode::OK, headers, body).into_response()
        }
        None => {
            tracing::debug!(%id, "Requested audio stream is unknown or expired");
            (StatusCode::NOT_FOUND, "Audio stream not found").into_response()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/audio/{id}", get(serve_audio))
}

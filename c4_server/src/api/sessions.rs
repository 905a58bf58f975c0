//! Read-only session lookup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use super::AppState;

/// `GET /api/v1/sessions/{code}`
///
/// Returns the session's snapshot, or `404 Not Found` if the code was never
/// issued, has been retired, or its session has already shut down.
pub async fn get_session(Path(code): Path<String>, State(state): State<AppState>) -> Response {
    let snapshot = match state.registry.resolve(&code) {
        Ok(session) => session.snapshot().await,
        Err(e) => Err(e),
    };

    match snapshot {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => {
            tracing::debug!(code = %code, "Session lookup failed: {}", e);
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": e.client_message() })),
            )
                .into_response()
        }
    }
}

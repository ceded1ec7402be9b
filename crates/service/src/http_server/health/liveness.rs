use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// The relay holds no external dependencies on its hot path: storage is
/// behind in-process providers and the trust directory is only consulted
/// during creation. Liveness therefore reduces to "the router answers".
#[tracing::instrument]
pub async fn handler() -> Response {
    let msg = serde_json::json!({"status": "ok"});
    (StatusCode::OK, Json(msg)).into_response()
}

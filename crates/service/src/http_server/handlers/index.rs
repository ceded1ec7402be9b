use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Trivial landing route. The relay has no browsable UI; everything
/// interesting lives under `/exchange`.
pub async fn index_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain")],
        "courier relay\n",
    )
}

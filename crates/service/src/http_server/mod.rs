use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod api;
mod handlers;
mod health;

use crate::AppState;

/// Maximum request body size in bytes (4 MB). Comfortably above the
/// trusted-tier ciphertext bound plus JSON framing; the tier limits
/// themselves are enforced by the lifecycle controller.
pub const MAX_BODY_SIZE_BYTES: usize = 4 * 1024 * 1024;

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    // Senders and recipients are browsers on arbitrary origins.
    let cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(vec![ACCEPT, CONTENT_TYPE, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(health::handler))
        .route("/exchange", post(api::exchange::create::handler))
        .route(
            "/exchange/:id/manifest.json",
            post(api::exchange::manifest::handler),
        )
        .fallback(handlers::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Run the relay HTTP server.
pub async fn run(
    state: AppState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = state.config().listen_addr;
    let log_level = state.config().log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(state).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "relay listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}

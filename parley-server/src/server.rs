use axum::{
    routing::{get, post},
    Router,
};
use parley_core::config::ServerConfig;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{chat_handler, status_handler};
use crate::state::AppState;

/// Build the relay router
pub fn build_router(state: AppState, cors_permissive: bool) -> Router {
    let app = Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/status", get(status_handler));

    let app = if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serve the relay until a shutdown signal arrives
pub async fn run_server(
    state: AppState,
    config: &ServerConfig,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = build_router(state, config.cors_permissive);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            tracing::info!("Server shutting down signal received");
        })
        .await?;

    Ok(())
}

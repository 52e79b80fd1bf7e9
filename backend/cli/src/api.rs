use axum::{Router, response::Json, routing::get};
use serde_json::{Value, json};
use tracing::info;

/// Build the HTTP router: health check plus the webhook routes.
pub fn build_router(webhook_router: Router) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(webhook_router)
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "relaybot",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Resolves on Ctrl-C or SIGTERM so in-flight webhooks can finish.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

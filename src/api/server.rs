//! HTTP server lifecycle.
//!
//! Binds the configured address, mounts `service_router`, and serves
//! until interrupted. Shutdown drains in-flight requests.

use tokio::net::TcpListener;

use crate::api::router::service_router;
use crate::api::types::ApiContext;
use crate::config::Settings;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(settings: &Settings) -> Result<(), ServeError> {
    let listener = TcpListener::bind(settings.bind_addr).await?;
    serve_on(listener, ApiContext::from_settings(settings)).await
}

/// Serve on an already-bound listener.
///
/// Factored out from `serve` so tests can bind an ephemeral port and
/// learn the address before the server starts.
pub async fn serve_on(listener: TcpListener, ctx: ApiContext) -> Result<(), ServeError> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "HTTP server listening");

    let app = service_router(ctx);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {e}");
            // Without a signal handler the server just runs until killed.
            std::future::pending::<()>().await;
        }
    }
}

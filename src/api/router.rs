//! Service router.
//!
//! Routes:
//! - `GET /health` — open, for liveness probes
//! - `POST /analyze` — full document analysis pipeline
//! - `POST /extract` — standalone local text extraction
//! - `POST /chat` — certification assistant
//!
//! Everything except `/health` requires the `X-API-Key` header.

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the service router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost
/// layer). Endpoint handlers use `State<ApiContext>` (provided via
/// `with_state`).
pub fn service_router(ctx: ApiContext) -> Router {
    // Protected routes — require the service API key.
    //
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Handler
    //
    // Extension must be outermost so the auth middleware can access
    // ApiContext. .with_state() converts Router<ApiContext> → Router<()>
    // so the from_fn layers (state=()) are compatible.
    let protected = Router::new()
        .route("/analyze", post(endpoints::analyze::analyze))
        .route("/extract", post(endpoints::extract::extract))
        .route("/chat", post(endpoints::chat::send))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_api_key))
        .layer(axum::Extension(ctx));

    // Unprotected routes (no auth required)
    let unprotected = Router::new().route("/health", get(endpoints::health::check));

    protected.merge(unprotected)
}

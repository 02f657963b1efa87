//! API key authentication middleware.
//!
//! Protected routes require an `X-API-Key` header matching the
//! configured service key. A missing header and a wrong key are
//! reported as distinct errors.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Require a valid service API key.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_api_key(
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match require_api_key_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_api_key_inner(
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    // 1. Extract the presented key
    let presented = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::MissingApiKey)?;

    // 2. Constant-time comparison against the configured key
    let matches: bool = presented
        .as_bytes()
        .ct_eq(ctx.service_api_key.as_bytes())
        .into();
    if !matches {
        return Err(ApiError::InvalidApiKey);
    }

    // 3. Process request
    Ok(next.run(req).await)
}

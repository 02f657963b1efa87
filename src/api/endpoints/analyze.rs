//! Document analysis endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::endpoints::require_http_url;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::analysis::{AnalysisRequest, AnalysisResult};

/// `POST /analyze` — fetch, extract and analyze one document.
///
/// Pipeline failures land inside the result envelope with
/// `success: false`; only a malformed request errors at the HTTP
/// level.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    require_http_url(&req.document_url)?;
    Ok(Json(ctx.pipeline.analyze(&req).await))
}

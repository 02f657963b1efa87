//! Standalone text extraction endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::require_http_url;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::extraction::{ExtractOptions, ExtractionStrategy};

#[derive(Deserialize)]
pub struct ExtractRequest {
    pub document_url: String,
    #[serde(default = "default_use_ocr")]
    pub use_ocr: bool,
}

fn default_use_ocr() -> bool {
    true
}

#[derive(Serialize)]
pub struct ExtractResponse {
    pub extracted_text: String,
    pub success: bool,
}

/// `POST /extract` — local text extraction without analysis.
///
/// Runs the local parser directly (no hosted provider), with the OCR
/// fallback controlled by `use_ocr`. Download and parse failures are
/// reported as internal errors, unlike `/analyze` which folds them
/// into its result envelope.
pub async fn extract(
    State(ctx): State<ApiContext>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    require_http_url(&req.document_url)?;

    let document = ctx.fetcher.fetch(&req.document_url).await?;

    let options = ExtractOptions {
        use_ocr: req.use_ocr,
        ..ExtractOptions::default()
    };
    let elements = ctx
        .local_extractor
        .extract(&document.bytes, &document.filename, &options)
        .await?;

    let text = elements
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let success = !text.is_empty();

    Ok(Json(ExtractResponse {
        extracted_text: text,
        success,
    }))
}

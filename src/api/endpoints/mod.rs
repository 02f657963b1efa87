//! API endpoint handlers.
//!
//! One module per route. Handlers stay thin; the work lives in the
//! pipeline and chat modules.

pub mod analyze;
pub mod chat;
pub mod extract;
pub mod health;

use crate::api::error::ApiError;

/// Reject URLs the document fetcher would not handle.
pub(crate) fn require_http_url(url: &str) -> Result<(), ApiError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "document_url must be an http or https URL".into(),
        ))
    }
}

pub mod types;
pub mod fetch;
pub mod remote;
pub mod local;
pub mod pdfium;
pub mod ocr;
pub mod orchestrator;

pub use types::*;
pub use fetch::*;
pub use remote::*;
pub use local::*;
pub use pdfium::*;
pub use ocr::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document download failed: {0}")]
    Download(String),

    #[error("Extraction API request failed: {0}")]
    RemoteRequest(String),

    #[error("Extraction API returned error (status {status}): {body}")]
    RemoteApi { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF rendering failed on page {page}: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),
}

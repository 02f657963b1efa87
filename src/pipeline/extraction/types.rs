//! Shared extraction types and the capability traits the strategies plug
//! into.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// What kind of content a provider element carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Table,
    Form,
    Page,
    Unknown,
}

impl ElementKind {
    /// Map a provider `type` label onto our kinds. A missing label is
    /// Unknown; labels we do not track collapse to Text.
    pub fn from_provider_label(label: Option<&str>) -> Self {
        match label {
            None => Self::Unknown,
            Some("Table") => Self::Table,
            Some("Form") => Self::Form,
            Some("Page") => Self::Page,
            Some(_) => Self::Text,
        }
    }
}

/// One unit of extracted content, page-located. Created by a strategy, held
/// for the duration of one analysis request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PageElement {
    pub text: String,
    pub kind: ElementKind,
    /// 1-based page number; 0 when the provider did not report one.
    pub page_number: u32,
    pub source_filename: String,
    /// HTML rendering of tabular content, when the provider supplies one.
    pub html: Option<String>,
}

/// Partition strategy requested from the hosted extraction provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    Fast,
    #[default]
    HiRes,
}

impl PartitionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::HiRes => "hi_res",
        }
    }
}

/// Options for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub strategy: PartitionStrategy,
    pub use_ocr: bool,
    pub extract_tables: bool,
    pub extract_forms: bool,
    pub languages: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strategy: PartitionStrategy::HiRes,
            use_ocr: true,
            extract_tables: true,
            extract_forms: false,
            languages: vec!["eng".to_string()],
        }
    }
}

/// One way of turning document bytes into page elements.
///
/// Strategies are tried in order by the extraction orchestrator; an Ok
/// empty result means "found nothing" and sends the orchestrator on to the
/// next strategy, same as an error.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    async fn extract(
        &self,
        document: &[u8],
        filename: &str,
        options: &ExtractOptions,
    ) -> Result<Vec<PageElement>, ExtractionError>;
}

/// Turns one rasterized page image (PNG bytes) into text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image_png: &[u8]) -> Result<String, ExtractionError>;
}

/// Renders one PDF page to a PNG at the given DPI.
///
/// Sync because the rendering library is; callers hand it the scratch file
/// path rather than bytes so the library does its own buffered reads.
pub trait PdfPageRenderer: Send + Sync {
    fn render_page(
        &self,
        pdf_path: &Path,
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError>;
}

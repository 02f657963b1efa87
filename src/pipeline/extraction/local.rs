//! Local extraction strategy: native PDF text layer with vision-OCR
//! fallback for scanned pages.
//!
//! Needs no credential. OCR runs only when both a page renderer and an OCR
//! engine are wired in; without them sparse pages keep whatever the text
//! layer held.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::pdfium::DEFAULT_RENDER_DPI;
use super::types::{
    ElementKind, ExtractOptions, ExtractionStrategy, OcrEngine, PageElement, PdfPageRenderer,
};
use super::ExtractionError;

/// Pages with fewer trimmed characters than this are treated as scanned.
const OCR_TEXT_THRESHOLD: usize = 50;

pub struct LocalPdfExtractor {
    renderer: Option<Box<dyn PdfPageRenderer>>,
    ocr: Option<Box<dyn OcrEngine>>,
}

impl LocalPdfExtractor {
    pub fn new() -> Self {
        Self {
            renderer: None,
            ocr: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn PdfPageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_ocr(mut self, ocr: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    fn ocr_ready(&self, options: &ExtractOptions) -> bool {
        options.use_ocr && self.renderer.is_some() && self.ocr.is_some()
    }

    async fn extract_pages(
        &self,
        document: &[u8],
        filename: &str,
        options: &ExtractOptions,
    ) -> Result<Vec<PageElement>, ExtractionError> {
        if document.is_empty() {
            return Ok(Vec::new());
        }

        let page_texts = pdf_extract::extract_text_from_mem_by_pages(document)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        // Scratch copy for the renderer. NamedTempFile removes it on drop,
        // which covers every exit path below including mid-loop errors.
        let scratch = if self.ocr_ready(options) {
            Some(write_scratch_pdf(document)?)
        } else {
            None
        };

        let mut elements = Vec::new();
        for (index, raw_text) in page_texts.iter().enumerate() {
            let mut text = raw_text.trim().to_string();

            if text.chars().count() < OCR_TEXT_THRESHOLD {
                if let Some(scratch) = &scratch {
                    text = self.ocr_page(scratch.path(), index, &text).await;
                }
            }

            if text.is_empty() {
                debug!(page = index + 1, "Skipping page with no text");
                continue;
            }

            elements.push(PageElement {
                text,
                kind: ElementKind::Page,
                page_number: (index + 1) as u32,
                source_filename: filename.to_string(),
                html: None,
            });
        }

        Ok(elements)
    }

    /// OCR one sparse page. On render or OCR failure the page keeps its
    /// text-layer text and the failure is logged.
    async fn ocr_page(&self, pdf_path: &Path, index: usize, fallback: &str) -> String {
        let (Some(renderer), Some(ocr)) = (&self.renderer, &self.ocr) else {
            return fallback.to_string();
        };

        match renderer.render_page(pdf_path, index, DEFAULT_RENDER_DPI) {
            Ok(png) => match ocr.recognize(&png).await {
                Ok(recognized) => recognized.trim().to_string(),
                Err(e) => {
                    warn!(page = index + 1, error = %e, "OCR failed, keeping text layer");
                    fallback.to_string()
                }
            },
            Err(e) => {
                warn!(page = index + 1, error = %e, "Page render failed, keeping text layer");
                fallback.to_string()
            }
        }
    }
}

impl Default for LocalPdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionStrategy for LocalPdfExtractor {
    fn name(&self) -> &'static str {
        "local_pdf"
    }

    async fn extract(
        &self,
        document: &[u8],
        filename: &str,
        options: &ExtractOptions,
    ) -> Result<Vec<PageElement>, ExtractionError> {
        self.extract_pages(document, filename, options).await
    }
}

/// Spill bytes to a `.pdf` scratch file the renderer can open.
fn write_scratch_pdf(document: &[u8]) -> Result<tempfile::NamedTempFile, ExtractionError> {
    let mut scratch = tempfile::Builder::new()
        .prefix("attesta-doc-")
        .suffix(".pdf")
        .tempfile()?;
    scratch.write_all(document)?;
    scratch.flush()?;
    Ok(scratch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::ocr::MockOcrEngine;
    use crate::pipeline::extraction::pdfium::MockPdfPageRenderer;

    /// Generate a valid PDF using lopdf (the library pdf-extract uses
    /// internally), one page per entry.
    fn make_test_pdf(pages: &[&str]) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            // Content stream: BT /F1 12 Tf (text) Tj ET
            let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        "F1" => font_id,
                    },
                },
            });
            kids.push(page_id.into());
        }

        let kid_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => kid_count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    const LONG_TEXT: &str =
        "Certificate of Incorporation for Acme Construction Ltd issued by the Registrar";

    #[tokio::test]
    async fn extracts_text_layer_pages() {
        let extractor = LocalPdfExtractor::new();
        let pdf = make_test_pdf(&[LONG_TEXT]);
        let elements = extractor
            .extract(&pdf, "cert.pdf", &ExtractOptions::default())
            .await
            .unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].kind, ElementKind::Page);
        assert_eq!(elements[0].page_number, 1);
        assert_eq!(elements[0].source_filename, "cert.pdf");
        assert!(
            elements[0].text.contains("Certificate"),
            "got: {}",
            elements[0].text
        );
    }

    #[tokio::test]
    async fn numbers_pages_from_one() {
        let extractor = LocalPdfExtractor::new();
        let pdf = make_test_pdf(&[LONG_TEXT, LONG_TEXT]);
        let elements = extractor
            .extract(&pdf, "two.pdf", &ExtractOptions::default())
            .await
            .unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].page_number, 1);
        assert_eq!(elements[1].page_number, 2);
    }

    #[tokio::test]
    async fn sparse_page_goes_through_ocr() {
        let extractor = LocalPdfExtractor::new()
            .with_renderer(Box::new(MockPdfPageRenderer::new(1)))
            .with_ocr(Box::new(MockOcrEngine::new("RECOVERED SCAN TEXT")));
        let pdf = make_test_pdf(&["ID 7"]);

        let elements = extractor
            .extract(&pdf, "scan.pdf", &ExtractOptions::default())
            .await
            .unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text, "RECOVERED SCAN TEXT");
    }

    #[tokio::test]
    async fn ocr_failure_keeps_text_layer() {
        let extractor = LocalPdfExtractor::new()
            .with_renderer(Box::new(MockPdfPageRenderer::new(1)))
            .with_ocr(Box::new(MockOcrEngine::failing()));
        let pdf = make_test_pdf(&["ID 7"]);

        let elements = extractor
            .extract(&pdf, "scan.pdf", &ExtractOptions::default())
            .await
            .unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text, "ID 7");
    }

    #[tokio::test]
    async fn ocr_disabled_by_option() {
        let extractor = LocalPdfExtractor::new()
            .with_renderer(Box::new(MockPdfPageRenderer::new(1)))
            .with_ocr(Box::new(MockOcrEngine::new("SHOULD NOT APPEAR")));
        let pdf = make_test_pdf(&["ID 7"]);
        let options = ExtractOptions {
            use_ocr: false,
            ..ExtractOptions::default()
        };

        let elements = extractor.extract(&pdf, "scan.pdf", &options).await.unwrap();
        assert_eq!(elements[0].text, "ID 7");
    }

    #[tokio::test]
    async fn long_pages_skip_ocr() {
        let extractor = LocalPdfExtractor::new()
            .with_renderer(Box::new(MockPdfPageRenderer::new(1)))
            .with_ocr(Box::new(MockOcrEngine::new("SHOULD NOT APPEAR")));
        let pdf = make_test_pdf(&[LONG_TEXT]);

        let elements = extractor
            .extract(&pdf, "cert.pdf", &ExtractOptions::default())
            .await
            .unwrap();
        assert!(elements[0].text.contains("Certificate"));
    }

    #[tokio::test]
    async fn invalid_pdf_returns_parse_error() {
        let extractor = LocalPdfExtractor::new();
        let err = extractor
            .extract(b"not a pdf", "bad.pdf", &ExtractOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::PdfParsing(_)));
    }

    #[tokio::test]
    async fn empty_document_yields_no_elements() {
        let extractor = LocalPdfExtractor::new();
        let elements = extractor
            .extract(&[], "empty.pdf", &ExtractOptions::default())
            .await
            .unwrap();
        assert!(elements.is_empty());
    }
}

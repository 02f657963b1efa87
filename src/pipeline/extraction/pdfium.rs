//! PDF page rendering via Google PDFium.
//!
//! Renders individual PDF pages to PNG images for vision model OCR of
//! scanned documents whose text layer is too sparse to use directly.
//!
//! `PdfiumRenderer` is stateless (`Send + Sync`). Each operation creates
//! a fresh `Pdfium` instance because the upstream type is `!Send`.
//! The OS caches `dlopen`/`LoadLibrary` calls, so repeat loads are near-free.

use std::io::Cursor;
use std::path::Path;

use image::ImageOutputFormat;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::types::PdfPageRenderer;
use super::ExtractionError;

/// Maximum dimension (width or height) for rendered page images.
/// Prevents OOM on extremely large pages or absurd DPI settings.
const MAX_DIMENSION_PX: u32 = 4096;

/// Default rendering DPI for OCR: 2x the PDF's native 72 points per inch.
pub const DEFAULT_RENDER_DPI: u32 = 144;

/// PDF points per inch (standard PDF unit).
const POINTS_PER_INCH: f32 = 72.0;

/// Renders PDF pages to PNG images using Google PDFium.
///
/// PDFium handles all PDF complexities: CIDFont encodings, embedded fonts,
/// form fields, transparency, layers.
pub struct PdfiumRenderer;

impl PdfiumRenderer {
    /// Create a new renderer, verifying the PDFium library is loadable.
    ///
    /// Discovery order:
    /// 1. `PDFIUM_DYNAMIC_LIB_PATH` env var (explicit path to library file)
    /// 2. Alongside the running executable
    /// 3. System library search paths
    pub fn new() -> Result<Self, ExtractionError> {
        // Verify library is loadable at construction time (fail-fast).
        let _ = load_pdfium()?;
        Ok(Self)
    }
}

/// Load the PDFium dynamic library, per the discovery order above.
fn load_pdfium() -> Result<Pdfium, ExtractionError> {
    // 1. Explicit path via env var
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        debug!(path = %path, "Loading PDFium from env var");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            ExtractionError::PdfRendering {
                page: 0,
                reason: format!("Failed to load PDFium from {path}: {e}"),
            }
        })?;
        return Ok(Pdfium::new(bindings));
    }

    // 2. Alongside the executable.
    // pdfium_platform_library_name_at_path() handles platform-specific names:
    //   Windows → pdfium.dll | Linux → libpdfium.so | macOS → libpdfium.dylib
    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let lib_path =
                Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                debug!(dir = %exe_dir.display(), "Loaded PDFium from executable directory");
                return Ok(Pdfium::new(bindings));
            }
        }
    }

    // 3. System library
    let bindings =
        Pdfium::bind_to_system_library().map_err(|e| ExtractionError::PdfRendering {
            page: 0,
            reason: format!(
                "PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
            ),
        })?;
    Ok(Pdfium::new(bindings))
}

/// Compute pixel dimensions for rendering, applying the dimension guard.
///
/// Returns (width_px, height_px), both clamped to [1, MAX_DIMENSION_PX].
/// Preserves aspect ratio when capping.
fn compute_render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let raw_w = (width_points * scale).max(1.0);
    let raw_h = (height_points * scale).max(1.0);

    let max_dim = raw_w.max(raw_h);
    if max_dim > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / max_dim;
        let w = ((raw_w * ratio) as u32).max(1).min(MAX_DIMENSION_PX);
        let h = ((raw_h * ratio) as u32).max(1).min(MAX_DIMENSION_PX);
        (w, h)
    } else {
        (raw_w as u32, raw_h as u32)
    }
}

impl PdfPageRenderer for PdfiumRenderer {
    fn render_page(
        &self,
        pdf_path: &Path,
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        let pdfium = load_pdfium()?;
        let document =
            pdfium
                .load_pdf_from_file(pdf_path, None)
                .map_err(|e| ExtractionError::PdfParsing(format!("Failed to load PDF: {e}")))?;

        let pages = document.pages();

        let page_number = u16::try_from(page_index).map_err(|_| ExtractionError::PdfRendering {
            page: page_index,
            reason: format!("Page index {page_index} exceeds u16 maximum"),
        })?;

        let page = pages
            .get(page_number)
            .map_err(|_| ExtractionError::PdfRendering {
                page: page_index,
                reason: format!(
                    "Page {page_index} out of range (document has {} pages)",
                    pages.len()
                ),
            })?;

        let width_points = page.width().value;
        let height_points = page.height().value;
        let (target_w, target_h) = compute_render_dimensions(width_points, height_points, dpi);

        let uncapped_w = (width_points * dpi as f32 / POINTS_PER_INCH) as u32;
        let uncapped_h = (height_points * dpi as f32 / POINTS_PER_INCH) as u32;
        if target_w != uncapped_w || target_h != uncapped_h {
            warn!(
                page = page_index,
                raw_width = uncapped_w,
                raw_height = uncapped_h,
                capped_width = target_w,
                capped_height = target_h,
                "Page dimensions capped to {MAX_DIMENSION_PX}px",
            );
        }

        let config = PdfRenderConfig::new()
            .set_target_width(target_w as i32)
            .set_maximum_height(target_h as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| ExtractionError::PdfRendering {
                page: page_index,
                reason: format!("Rendering failed: {e}"),
            })?;

        let dynamic_image = bitmap.as_image();
        let mut cursor = Cursor::new(Vec::new());
        dynamic_image
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;

        let png_bytes = cursor.into_inner();

        debug!(
            page = page_index,
            width = target_w,
            height = target_h,
            png_size = png_bytes.len(),
            "Rendered PDF page to PNG"
        );

        Ok(png_bytes)
    }
}

// ── Mock for testing ──────────────────────────────────────

/// Mock PDF page renderer returning a minimal PNG for each valid page.
///
/// Used by extraction tests that need a PdfPageRenderer without requiring
/// the actual PDFium binary.
pub struct MockPdfPageRenderer {
    page_count: usize,
}

impl MockPdfPageRenderer {
    pub fn new(page_count: usize) -> Self {
        Self { page_count }
    }
}

impl PdfPageRenderer for MockPdfPageRenderer {
    fn render_page(
        &self,
        _pdf_path: &Path,
        page_index: usize,
        _dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        if page_index >= self.page_count {
            return Err(ExtractionError::PdfRendering {
                page: page_index,
                reason: format!(
                    "Page {page_index} out of range (mock has {} pages)",
                    self.page_count
                ),
            });
        }
        Ok(minimal_png())
    }
}

/// Minimal valid 1x1 white pixel PNG for mock testing.
fn minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1
        0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, // 8-bit RGB
        0xDE, // IHDR CRC
        0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, // IDAT chunk
        0x08, 0xD7, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, // compressed
        0x00, 0x02, 0x00, 0x01, 0xE2, 0x21, 0xBC, 0x33, // IDAT CRC
        0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, // IEND chunk
        0xAE, 0x42, 0x60, 0x82, // IEND CRC
    ]
}

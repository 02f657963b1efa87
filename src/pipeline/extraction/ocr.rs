//! Vision-model OCR for scanned pages.
//!
//! A page whose text layer is too sparse gets rasterized and sent to a
//! vision-capable chat model for transcription.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, info};

use super::types::OcrEngine;
use super::ExtractionError;
use crate::openai::OpenAiClient;

/// Transcription prompt sent with each rasterized page.
const OCR_PROMPT: &str = "Extract all visible text from this scanned document page. \
Transcribe the text exactly as it appears, preserving line breaks and reading order. \
Output only the transcribed text, with no commentary.";

/// Transcription should not be creative.
const OCR_TEMPERATURE: f32 = 0.0;

/// OCR engine backed by a vision-capable chat model.
pub struct VisionOcr {
    client: OpenAiClient,
    model: String,
}

impl VisionOcr {
    pub fn new(client: OpenAiClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for VisionOcr {
    async fn recognize(&self, image_png: &[u8]) -> Result<String, ExtractionError> {
        let started = std::time::Instant::now();
        let encoded = BASE64.encode(image_png);
        debug!(
            model = %self.model,
            image_bytes = image_png.len(),
            "Sending page image to vision OCR"
        );

        let text = self
            .client
            .chat_vision(&self.model, OCR_PROMPT, &encoded, OCR_TEMPERATURE)
            .await
            .map_err(|e| ExtractionError::OcrProcessing(e.to_string()))?;

        info!(
            model = %self.model,
            chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Vision OCR complete"
        );

        Ok(text)
    }
}

// ── Mock for testing ──────────────────────────────────────

/// Mock OCR engine with configurable output, or a forced failure.
pub struct MockOcrEngine {
    text: String,
    fail: bool,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl OcrEngine for MockOcrEngine {
    async fn recognize(&self, _image_png: &[u8]) -> Result<String, ExtractionError> {
        if self.fail {
            return Err(ExtractionError::OcrProcessing(
                "mock OCR failure".to_string(),
            ));
        }
        Ok(self.text.clone())
    }
}

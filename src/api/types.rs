//! Shared state for the API layer.

use std::sync::Arc;

use crate::chat::ChatAssistant;
use crate::config::{self, Settings};
use crate::openai::OpenAiClient;
use crate::pipeline::analysis::{AnalysisPipeline, OpenAiEmbedder, OpenAiGenerator};
use crate::pipeline::extraction::{
    DocumentExtractor, DocumentFetcher, LocalPdfExtractor, PdfiumRenderer, RemoteExtractor,
    VisionOcr,
};
use crate::thread_context::ThreadContextStore;

// ═══════════════════════════════════════════════════════════
// API context — shared state for all routes and middleware
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
///
/// Built once at startup from [`Settings`] and cloned into every
/// request. Missing credentials degrade the relevant capability
/// instead of failing construction; the service always comes up.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<AnalysisPipeline>,
    pub assistant: Arc<ChatAssistant>,
    pub fetcher: DocumentFetcher,
    pub local_extractor: Arc<LocalPdfExtractor>,
    pub service_api_key: String,
}

impl ApiContext {
    /// Wire the full service graph from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let openai = settings.openai_api_key.as_deref().map(|key| {
            OpenAiClient::new(&settings.openai_base_url, key, config::DEFAULT_TIMEOUT_SECS)
        });
        if openai.is_none() {
            tracing::warn!("No OpenAI API key configured; analysis, OCR and chat are degraded");
        }

        // Hosted extraction runs first when credentials exist; local
        // parsing is always registered as the fallback.
        let mut extractor = DocumentExtractor::new();
        if let Some(key) = settings.unstructured_api_key.as_deref() {
            extractor = extractor.with_strategy(Arc::new(RemoteExtractor::new(
                &settings.unstructured_api_url,
                key,
            )));
        } else {
            tracing::warn!("No extraction API key configured; using local extraction only");
        }

        let mut local = LocalPdfExtractor::new();
        match PdfiumRenderer::new() {
            Ok(renderer) => local = local.with_renderer(Box::new(renderer)),
            Err(e) => tracing::warn!(error = %e, "Pdfium unavailable; page rendering disabled"),
        }
        if let Some(client) = &openai {
            local = local.with_ocr(Box::new(VisionOcr::new(client.clone(), config::OCR_MODEL)));
        }
        let local = Arc::new(local);
        extractor = extractor.with_strategy(local.clone());

        tracing::info!(strategies = ?extractor.strategy_names(), "Extraction chain configured");

        let mut pipeline = AnalysisPipeline::new(
            DocumentFetcher::new(),
            extractor,
            Arc::new(ThreadContextStore::new()),
        );
        if let Some(client) = &openai {
            pipeline = pipeline
                .with_generator(Arc::new(OpenAiGenerator::new(client.clone())))
                .with_embedder(Arc::new(OpenAiEmbedder::new(client.clone())));
        }

        let assistant = ChatAssistant::load(&settings.data_dir, openai);

        Self {
            pipeline: Arc::new(pipeline),
            assistant: Arc::new(assistant),
            fetcher: DocumentFetcher::new(),
            local_extractor: local,
            service_api_key: settings.service_api_key.clone(),
        }
    }
}

//! Full analysis pipeline: fetch, extract, retrieve, generate, verify.
//!
//! The public operation never fails: every fallible phase is absorbed at
//! its boundary and reported inside the result envelope, so one bad
//! document or provider outage cannot take down the request.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::openai::ProviderError;
use crate::pipeline::extraction::{DocumentExtractor, DocumentFetcher, ElementKind, PageElement};
use crate::thread_context::ThreadContextStore;

use super::chunker::TextChunker;
use super::consistency::parse_company_verdict;
use super::prompt;
use super::retrieval::VectorIndex;
use super::types::{
    AnalysisMetadata, AnalysisRequest, AnalysisResult, EmbeddingProvider, FormContent,
    TableContent, TextGenerator,
};

/// Extracted text shorter than this (trimmed) is not worth a model call.
const MIN_ANALYSIS_CHARS: usize = 50;

/// Chunks retrieved as context for the analysis prompt.
const RETRIEVAL_TOP_K: usize = 4;

/// Coordinates one document analysis end to end.
///
/// Generator and embedder are optional: without them the pipeline still
/// extracts, but reports that analysis is unavailable instead of calling
/// a provider it has no credential for.
pub struct AnalysisPipeline {
    fetcher: DocumentFetcher,
    extractor: DocumentExtractor,
    generator: Option<Arc<dyn TextGenerator>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    context_store: Arc<ThreadContextStore>,
    chunker: TextChunker,
}

impl AnalysisPipeline {
    pub fn new(
        fetcher: DocumentFetcher,
        extractor: DocumentExtractor,
        context_store: Arc<ThreadContextStore>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            generator: None,
            embedder: None,
            context_store,
            chunker: TextChunker::new(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Analyze one document and report the outcome in-envelope.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult {
        let request_id = Uuid::new_v4();
        info!(
            request_id = %request_id,
            document_type = %request.document_type,
            url = %request.document_url,
            "Starting document analysis"
        );

        // Step 1: Download the document.
        let document = match self.fetcher.fetch(&request.document_url).await {
            Ok(document) => document,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Document download failed");
                return AnalysisResult::failure("No content extracted from document");
            }
        };

        // Step 2: Run the extraction strategy chain.
        let options = request.extract_options();
        let elements = self
            .extractor
            .extract(&document.bytes, &document.filename, &options)
            .await;
        if elements.is_empty() {
            return AnalysisResult::failure("No content extracted from document");
        }

        let extracted_text = combine_elements(&elements);

        // Step 3: History from earlier documents on the same application.
        let history_preamble = request
            .thread_id
            .as_deref()
            .and_then(|id| self.context_store.get(id))
            .map(|ctx| ctx.history_preamble())
            .unwrap_or_default();

        let expected_company = request
            .application_company_name
            .as_deref()
            .unwrap_or_default();

        // Step 4: Retrieval-augmented analysis.
        let analysis = self
            .run_analysis(
                &extracted_text,
                &request.document_type,
                &history_preamble,
                expected_company,
            )
            .await;

        // Step 5: Lift structured content out of the element stream.
        let tables = collect_tables(&elements);
        let forms = if request.extract_forms {
            collect_forms(&elements)
        } else {
            Vec::new()
        };

        // Step 6: Company-consistency verdict from the analysis text.
        let verdict = parse_company_verdict(&analysis, expected_company);

        // Step 7: Record this document on its application thread.
        if let Some(thread_id) = request.thread_id.as_deref() {
            self.context_store.record_document(
                thread_id,
                request.application_company_name.as_deref(),
                &request.document_type,
                verdict.verdict,
                verdict.mentioned_companies.as_deref(),
            );
        }

        let total_chars = extracted_text.chars().count();
        info!(
            request_id = %request_id,
            elements = elements.len(),
            chars = total_chars,
            company_match = ?verdict.verdict,
            "Document analysis finished"
        );

        AnalysisResult {
            success: true,
            error: None,
            extracted_text,
            analysis,
            tables,
            forms,
            metadata: Some(AnalysisMetadata {
                document_type: request.document_type.clone(),
                strategy: request.strategy,
                pages_processed: elements.len(),
                total_chars,
            }),
            company_match: verdict.verdict,
            company_match_detail: verdict.detail,
        }
    }

    /// Produce the analysis text. Unavailable providers, thin documents and
    /// provider failures all collapse into the text itself; the request
    /// still succeeds.
    async fn run_analysis(
        &self,
        extracted_text: &str,
        document_type: &str,
        history_preamble: &str,
        expected_company: &str,
    ) -> String {
        let (Some(generator), Some(embedder)) = (&self.generator, &self.embedder) else {
            return "OpenAI API key not configured. Analysis unavailable.".to_string();
        };

        if extracted_text.trim().chars().count() < MIN_ANALYSIS_CHARS {
            return "Insufficient text extracted from document for analysis.".to_string();
        }

        match self
            .generate_over_retrieved(
                generator.as_ref(),
                embedder.as_ref(),
                extracted_text,
                document_type,
                history_preamble,
                expected_company,
            )
            .await
        {
            Ok(analysis) if analysis.trim().is_empty() => {
                "Analysis completed but no result returned.".to_string()
            }
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "Analysis generation failed");
                format!("Analysis error: {e}")
            }
        }
    }

    /// Chunk, index, retrieve, generate.
    async fn generate_over_retrieved(
        &self,
        generator: &dyn TextGenerator,
        embedder: &dyn EmbeddingProvider,
        extracted_text: &str,
        document_type: &str,
        history_preamble: &str,
        expected_company: &str,
    ) -> Result<String, ProviderError> {
        let chunks = self.chunker.chunk(extracted_text);
        let embeddings = embedder.embed(&chunks).await?;

        let mut index = VectorIndex::new();
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            index.add(chunk, embedding);
        }

        let query_embedding = embedder
            .embed(&[prompt::analysis_query(document_type)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ResponseParsing("empty embedding batch".to_string()))?;

        let retrieved = index.search(&query_embedding, RETRIEVAL_TOP_K);
        debug!(
            chunks = index.len(),
            retrieved = retrieved.len(),
            "Retrieved context for analysis"
        );
        let context = retrieved
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = prompt::analysis_prompt(
            document_type,
            history_preamble,
            (!expected_company.is_empty()).then_some(expected_company),
            &context,
        );
        generator.generate(&prompt).await
    }
}

fn combine_elements(elements: &[PageElement]) -> String {
    elements
        .iter()
        .map(|element| element.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn collect_tables(elements: &[PageElement]) -> Vec<TableContent> {
    elements
        .iter()
        .filter(|element| element.kind == ElementKind::Table)
        .map(|element| TableContent {
            text: element.text.clone(),
            html: element.html.clone().unwrap_or_default(),
            page: element.page_number,
        })
        .collect()
}

fn collect_forms(elements: &[PageElement]) -> Vec<FormContent> {
    elements
        .iter()
        .filter(|element| element.kind == ElementKind::Form)
        .map(|element| FormContent {
            text: element.text.clone(),
            page: element.page_number,
        })
        .collect()
}

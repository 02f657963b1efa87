//! Request and result types for the analysis pipeline, plus the provider
//! seams the RAG step talks through.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::openai::ProviderError;
use crate::pipeline::extraction::{ExtractOptions, PartitionStrategy};

use super::consistency::CompanyMatch;

// ═══════════════════════════════════════════════════════════════════════
// Request
// ═══════════════════════════════════════════════════════════════════════

/// Inbound analysis request, deserialized straight from the endpoint body.
/// Defaults mirror `ExtractOptions::default()`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub document_url: String,
    pub document_type: String,
    #[serde(default)]
    pub strategy: PartitionStrategy,
    #[serde(default = "default_true")]
    pub use_ocr: bool,
    #[serde(default = "default_true")]
    pub extract_tables: bool,
    #[serde(default)]
    pub extract_forms: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Company the application was filed under; enables the consistency
    /// verdict when present.
    #[serde(default)]
    pub application_company_name: Option<String>,
    /// Application thread this document belongs to; enables cross-document
    /// history when present.
    #[serde(default)]
    pub thread_id: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

impl AnalysisRequest {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            strategy: self.strategy,
            use_ocr: self.use_ocr,
            extract_tables: self.extract_tables,
            extract_forms: self.extract_forms,
            languages: self.languages.clone(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Result envelope
// ═══════════════════════════════════════════════════════════════════════

/// Tabular content lifted out of the element stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableContent {
    pub text: String,
    pub html: String,
    pub page: u32,
}

/// Form content lifted out of the element stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormContent {
    pub text: String,
    pub page: u32,
}

/// Run statistics reported alongside a successful analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub document_type: String,
    pub strategy: PartitionStrategy,
    /// Number of extracted elements that fed the analysis.
    pub pages_processed: usize,
    /// Character count of the combined extracted text.
    pub total_chars: usize,
}

/// Outcome envelope for one analysis run. Every key is always serialized
/// (null or empty rather than absent) so callers can rely on the shape;
/// failures are reported inside the envelope, not as transport errors.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub error: Option<String>,
    pub extracted_text: String,
    pub analysis: String,
    pub tables: Vec<TableContent>,
    pub forms: Vec<FormContent>,
    pub metadata: Option<AnalysisMetadata>,
    pub company_match: CompanyMatch,
    pub company_match_detail: Option<String>,
}

impl AnalysisResult {
    /// Terminal failure envelope; the error text is the only signal.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            extracted_text: String::new(),
            analysis: String::new(),
            tables: Vec::new(),
            forms: Vec::new(),
            metadata: None,
            company_match: CompanyMatch::Unknown,
            company_match_detail: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Provider seams
// ═══════════════════════════════════════════════════════════════════════

/// Text generation capability used for the analysis itself.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Embedding capability used to index chunks and the retrieval query.
/// Vectors come back in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

// ── Mocks for testing ──────────────────────────────────────────────────

/// Mock generator for unit testing without a provider; records every
/// prompt it is handed.
pub struct MockGenerator {
    pub response: String,
    pub fail: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let mut mock = Self::new("");
        mock.fail = true;
        mock
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if self.fail {
            return Err(ProviderError::HttpClient(
                "mock generator failure".to_string(),
            ));
        }
        Ok(self.response.clone())
    }
}

/// Deterministic embedding derived from surface text statistics. Nothing
/// like a semantic vector, but stable across runs and non-zero for any
/// input, which is all retrieval tests need.
pub fn mock_embedding(text: &str) -> Vec<f32> {
    let alpha = text.chars().filter(|c| c.is_alphabetic()).count() as f32;
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count() as f32;
    let spaces = text.chars().filter(|c| c.is_whitespace()).count() as f32;
    vec![
        text.chars().count() as f32 + 1.0,
        alpha + 1.0,
        digits + 1.0,
        spaces + 1.0,
    ]
}

/// Mock embedder backed by [`mock_embedding`].
pub struct MockEmbedder {
    pub fail: bool,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Connection("mock embedder".to_string()));
        }
        Ok(texts.iter().map(|t| mock_embedding(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_request_gets_service_defaults() {
        let request: AnalysisRequest = serde_json::from_str(
            r#"{"document_url": "https://docs.example/cert.pdf", "document_type": "certificate"}"#,
        )
        .unwrap();

        assert_eq!(request.strategy, PartitionStrategy::HiRes);
        assert!(request.use_ocr);
        assert!(request.extract_tables);
        assert!(!request.extract_forms);
        assert_eq!(request.languages, vec!["eng".to_string()]);
        assert!(request.application_company_name.is_none());
        assert!(request.thread_id.is_none());
    }

    #[test]
    fn full_request_round_trips_every_field() {
        let request: AnalysisRequest = serde_json::from_str(
            r#"{
                "document_url": "https://docs.example/permit.pdf",
                "document_type": "works permit",
                "strategy": "fast",
                "use_ocr": false,
                "extract_tables": false,
                "extract_forms": true,
                "languages": ["eng", "fra"],
                "application_company_name": "Acme Corp",
                "thread_id": "APP-2031"
            }"#,
        )
        .unwrap();

        assert_eq!(request.strategy, PartitionStrategy::Fast);
        assert!(!request.use_ocr);
        assert!(request.extract_forms);
        assert_eq!(request.languages, vec!["eng", "fra"]);
        assert_eq!(request.application_company_name.as_deref(), Some("Acme Corp"));
        assert_eq!(request.thread_id.as_deref(), Some("APP-2031"));

        let options = request.extract_options();
        assert_eq!(options.strategy, PartitionStrategy::Fast);
        assert!(!options.use_ocr);
        assert!(!options.extract_tables);
        assert!(options.extract_forms);
    }

    #[test]
    fn failure_envelope_keeps_the_full_shape() {
        let value =
            serde_json::to_value(AnalysisResult::failure("No content extracted from document"))
                .unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "No content extracted from document");
        assert_eq!(value["extracted_text"], "");
        assert_eq!(value["analysis"], "");
        assert_eq!(value["tables"], serde_json::json!([]));
        assert_eq!(value["forms"], serde_json::json!([]));
        assert_eq!(value["metadata"], serde_json::Value::Null);
        assert_eq!(value["company_match"], serde_json::Value::Null);
        assert_eq!(value["company_match_detail"], serde_json::Value::Null);
    }

    #[test]
    fn metadata_serializes_strategy_as_wire_label() {
        let metadata = AnalysisMetadata {
            document_type: "certificate".to_string(),
            strategy: PartitionStrategy::HiRes,
            pages_processed: 3,
            total_chars: 1200,
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["strategy"], "hi_res");
        assert_eq!(value["pages_processed"], 3);
        assert_eq!(value["total_chars"], 1200);
    }

    #[tokio::test]
    async fn mock_generator_records_prompts() {
        let generator = MockGenerator::new("fine");
        let _ = generator.generate("first").await.unwrap();
        let _ = generator.generate("second").await.unwrap();
        assert_eq!(generator.last_prompt().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn mock_embedder_is_deterministic_and_uniform() {
        let embedder = MockEmbedder::new();
        let texts = vec!["Acme Corp Ltd".to_string(), "permit 42".to_string()];
        let first = embedder.embed(&texts).await.unwrap();
        let second = embedder.embed(&texts).await.unwrap();
        assert_eq!(first, second);
        assert!(first.iter().all(|v| v.len() == first[0].len()));
    }
}

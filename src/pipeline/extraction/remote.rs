//! Hosted structured-extraction strategy (unstructured-compatible API).
//!
//! Uploads the document as multipart form data and maps the returned typed
//! elements onto [`PageElement`]s. Registered only when a provider
//! credential is configured.

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use super::types::{ElementKind, ExtractOptions, ExtractionStrategy, PageElement};
use super::ExtractionError;
use crate::config;

pub struct RemoteExtractor {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl RemoteExtractor {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_timeout(base_url, api_key, config::DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        }
    }

    async fn partition(
        &self,
        document: &[u8],
        filename: &str,
        options: &ExtractOptions,
    ) -> Result<Vec<PageElement>, ExtractionError> {
        let url = format!("{}/general/v0/general", self.base_url);

        let file_part = multipart::Part::bytes(document.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ExtractionError::RemoteRequest(e.to_string()))?;

        let mut form = multipart::Form::new()
            .part("files", file_part)
            .text("strategy", options.strategy.as_str())
            .text("infer_table_structure", bool_field(options.extract_tables))
            .text("extract_forms", bool_field(options.extract_forms));

        // The provider only accepts language hints on OCR-enabled runs.
        if options.use_ocr && !options.languages.is_empty() {
            for language in &options.languages {
                form = form.text("languages", language.clone());
            }
        }

        let response = self
            .client
            .post(&url)
            .header("unstructured-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::RemoteApi {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ProviderResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::ResponseParsing(e.to_string()))?;

        Ok(map_elements(parsed.into_elements(), filename))
    }

    fn request_error(&self, e: reqwest::Error) -> ExtractionError {
        if e.is_timeout() {
            ExtractionError::RemoteRequest(format!(
                "request timed out after {}s",
                self.timeout_secs
            ))
        } else {
            ExtractionError::RemoteRequest(e.to_string())
        }
    }
}

#[async_trait]
impl ExtractionStrategy for RemoteExtractor {
    fn name(&self) -> &'static str {
        "remote_api"
    }

    async fn extract(
        &self,
        document: &[u8],
        filename: &str,
        options: &ExtractOptions,
    ) -> Result<Vec<PageElement>, ExtractionError> {
        self.partition(document, filename, options).await
    }
}

fn bool_field(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// The provider returns either a bare element list or `{"elements": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProviderResponse {
    List(Vec<RawElement>),
    Object { elements: Vec<RawElement> },
}

impl ProviderResponse {
    fn into_elements(self) -> Vec<RawElement> {
        match self {
            Self::List(elements) => elements,
            Self::Object { elements } => elements,
        }
    }
}

#[derive(Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
    text_content: Option<String>,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Deserialize, Default)]
struct RawMetadata {
    page_number: Option<u32>,
    filename: Option<String>,
    text_as_html: Option<String>,
}

/// Keep only elements with text; `text` wins over `text_content` unless
/// empty.
fn map_elements(raw: Vec<RawElement>, upload_filename: &str) -> Vec<PageElement> {
    raw.into_iter()
        .filter_map(|element| {
            let text = element
                .text
                .filter(|t| !t.is_empty())
                .or(element.text_content)
                .unwrap_or_default();
            if text.is_empty() {
                return None;
            }
            Some(PageElement {
                text,
                kind: ElementKind::from_provider_label(element.kind.as_deref()),
                page_number: element.metadata.page_number.unwrap_or(0),
                source_filename: element
                    .metadata
                    .filename
                    .unwrap_or_else(|| upload_filename.to_string()),
                html: element.metadata.text_as_html,
            })
        })
        .collect()
}

//! OpenAI-backed implementations of the analysis provider seams.

use async_trait::async_trait;

use crate::config::{ANALYSIS_MODEL, EMBEDDING_MODEL};
use crate::openai::{ChatMessage, OpenAiClient, ProviderError};

use super::types::{EmbeddingProvider, TextGenerator};

/// Chat-completion generator pinned to the analysis model at temperature
/// zero, so repeated runs over one document stay comparable.
pub struct OpenAiGenerator {
    client: OpenAiClient,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            model: ANALYSIS_MODEL.to_string(),
            temperature: 0.0,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.client
            .chat(&self.model, &[ChatMessage::user(prompt)], self.temperature)
            .await
    }
}

/// Embedding provider pinned to the embedding model.
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            model: EMBEDDING_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.client.embed(&self.model, texts).await
    }
}

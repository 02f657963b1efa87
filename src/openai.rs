//! HTTP client for an OpenAI-compatible provider: chat completions,
//! vision completions (used for OCR), and embeddings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Model provider is not reachable at {0}")]
    Connection(String),

    #[error("Model provider request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Model provider returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// One turn in a chat completion conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Client for an OpenAI-compatible API. The base URL is configurable so the
/// service can point at compatible self-hosted gateways.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
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

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Plain text completion: returns the first choice's message content.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model,
            messages,
            temperature,
        };
        let parsed: ChatCompletionResponse = self.post_json("/v1/chat/completions", &body).await?;
        first_choice_content(parsed)
    }

    /// Vision completion over one PNG image (base64-encoded by the caller).
    pub async fn chat_vision(
        &self,
        model: &str,
        prompt: &str,
        image_base64: &str,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let body = VisionCompletionRequest {
            model,
            messages: vec![VisionMessage {
                role: "user",
                content: vec![
                    VisionPart::Text { text: prompt },
                    VisionPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/png;base64,{image_base64}"),
                        },
                    },
                ],
            }],
            temperature,
        };
        let parsed: ChatCompletionResponse = self.post_json("/v1/chat/completions", &body).await?;
        first_choice_content(parsed)
    }

    /// Embed a batch of texts; vectors come back in input order.
    pub async fn embed(
        &self,
        model: &str,
        input: &[String],
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let body = EmbeddingRequest { model, input };
        let parsed: EmbeddingResponse = self.post_json("/v1/embeddings", &body).await?;
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ProviderError::ResponseParsing(e.to_string()))
    }

    fn request_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_connect() {
            ProviderError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else {
            ProviderError::HttpClient(e.to_string())
        }
    }
}

fn first_choice_content(parsed: ChatCompletionResponse) -> Result<String, ProviderError> {
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| ProviderError::ResponseParsing("response contained no choices".to_string()))
}

/// Request body for /v1/chat/completions
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

/// Request body for /v1/chat/completions with image content parts
#[derive(Serialize)]
struct VisionCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<VisionMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct VisionMessage<'a> {
    role: &'a str,
    content: Vec<VisionPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum VisionPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

/// Response body from /v1/chat/completions
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Request body for /v1/embeddings
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response body from /v1/embeddings
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = OpenAiClient::new("http://localhost:9999/", "key", 60);
        assert_eq!(client.base_url(), "http://localhost:9999");
    }

    #[test]
    fn chat_request_serializes_openai_shape() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let body = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn vision_parts_serialize_with_type_tags() {
        let part = VisionPart::ImageUrl {
            image_url: ImageUrl {
                url: "data:image/png;base64,AAAA".to_string(),
            },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/png;base64,AAAA");

        let text = VisionPart::Text { text: "read this" };
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["type"], "text");
    }

    #[test]
    fn embedding_response_parses_vectors_in_order() {
        let raw = r#"{"data":[{"embedding":[0.1,0.2],"index":0},{"embedding":[0.3,0.4],"index":1}]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn first_choice_content_rejects_empty_choices() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = first_choice_content(parsed).unwrap_err();
        assert!(matches!(err, ProviderError::ResponseParsing(_)));
    }

    #[test]
    fn first_choice_content_returns_message() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"done"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_choice_content(parsed).unwrap(), "done");
    }
}

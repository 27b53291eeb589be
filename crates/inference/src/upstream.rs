//! Upstream chat-completion client.
//!
//! Talks to a FriendliAI-style dedicated chat endpoint: one user message
//! whose content is a list of parts (optional image as a data URI, then the
//! prompt text); the answer comes back as `choices[0].message.content`.
//! HTTP 503 means "endpoint still waking up" and is the only retryable
//! signal; every other non-success is terminal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use kc_core::AnalyzeRequest;

use crate::{GatewayError, GatewayResult};

/// Sampling parameters fixed for the patient-education model.
const MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f32 = 0.2;
const TOP_P: f32 = 0.9;
const FREQUENCY_PENALTY: f32 = 0.15;

/// Outcome of a single upstream attempt.
///
/// Terminal failures (bad status, transport errors) are returned as
/// `Err(GatewayError)` instead; this enum only distinguishes "answered"
/// from "retry later".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The endpoint answered; the payload is the full analysis text.
    Completed(String),
    /// HTTP 503: the endpoint is still warming up.
    Unavailable { body: String },
}

/// The seam between the gateway's retry loop and the network.
///
/// Production uses [`MedGemmaClient`]; tests substitute fakes that script
/// a sequence of outcomes.
#[async_trait]
pub trait ChatCompletions: Send + Sync {
    async fn complete(&self, request: &AnalyzeRequest) -> GatewayResult<AttemptOutcome>;
}

/// Upstream endpoint configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    base_url: String,
    api_key: String,
    model: String,
}

impl UpstreamConfig {
    /// Create a new `UpstreamConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingCredential`] for a blank API key and
    /// [`GatewayError::InvalidConfig`] for a blank URL or model id.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> GatewayResult<Self> {
        let base_url = base_url.into();
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(GatewayError::MissingCredential);
        }
        if base_url.trim().is_empty() {
            return Err(GatewayError::InvalidConfig("upstream URL cannot be empty".into()));
        }
        if model.trim().is_empty() {
            return Err(GatewayError::InvalidConfig("model id cannot be empty".into()));
        }
        Ok(Self {
            base_url,
            api_key,
            model,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Shown when the upstream answers 2xx but with no usable choice.
const EMPTY_ANSWER: &str = "No response generated.";

/// Production chat-completion client over HTTP.
pub struct MedGemmaClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl MedGemmaClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn build_body<'a>(&'a self, request: &'a AnalyzeRequest) -> ChatRequestBody<'a> {
        let mut content = Vec::new();
        if let Some(image) = &request.image_base64 {
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:image/jpeg;base64,{image}"),
                },
            });
        }
        content.push(ContentPart::Text {
            text: &request.prompt,
        });

        ChatRequestBody {
            model: &self.config.model,
            messages: vec![Message {
                role: "user",
                content,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            frequency_penalty: FREQUENCY_PENALTY,
        }
    }
}

#[async_trait]
impl ChatCompletions for MedGemmaClient {
    async fn complete(&self, request: &AnalyzeRequest) -> GatewayResult<AttemptOutcome> {
        let response = self
            .http
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(&self.build_body(request))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: ChatResponseBody = response.json().await?;
            let answer = body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_else(|| EMPTY_ANSWER.to_string());
            return Ok(AttemptOutcome::Completed(answer));
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Ok(AttemptOutcome::Unavailable { body });
        }

        Err(GatewayError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rejects_blank_credential() {
        let err = UpstreamConfig::new("https://example.test/v1/chat", " ", "model").unwrap_err();
        assert!(matches!(err, GatewayError::MissingCredential));
    }

    #[test]
    fn test_config_rejects_blank_url_and_model() {
        assert!(UpstreamConfig::new("", "key", "model").is_err());
        assert!(UpstreamConfig::new("https://example.test", "key", "  ").is_err());
    }

    #[test]
    fn test_body_orders_image_before_text() {
        let config =
            UpstreamConfig::new("https://example.test/v1/chat", "key", "dep0ju34hez4juy").unwrap();
        let client = MedGemmaClient::new(config);
        let request = AnalyzeRequest::with_image("read this report", "QUJD");
        let body = serde_json::to_value(client.build_body(&request)).unwrap();

        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image_url");
        assert_eq!(
            content[0]["image_url"]["url"],
            "data:image/jpeg;base64,QUJD"
        );
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "read this report");
        assert_eq!(body["model"], "dep0ju34hez4juy");
        assert_eq!(body["max_tokens"], 2048);
    }

    #[test]
    fn test_body_without_image_is_text_only() {
        let config =
            UpstreamConfig::new("https://example.test/v1/chat", "key", "model").unwrap();
        let client = MedGemmaClient::new(config);
        let request = AnalyzeRequest::text("explain my creatinine");
        let body = serde_json::to_value(client.build_body(&request)).unwrap();
        let content = body["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");
    }

    #[test]
    fn test_answer_parsing_falls_back_when_empty() {
        let body: ChatResponseBody = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let answer = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| EMPTY_ANSWER.to_string());
        assert_eq!(answer, EMPTY_ANSWER);
    }
}

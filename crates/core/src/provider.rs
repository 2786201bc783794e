//! Provider trait: the abstraction over LLM chat-completion backends.
//!
//! A Provider knows how to send a system + user exchange to an LLM and
//! return either a decoded object (when the backend validated the reply
//! against a schema itself) or the raw reply text.
//!
//! Implementations live in `stylecraft-providers`; tests use scripted mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// A JSON schema the backend should enforce on its reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Schema name sent to the backend (e.g. "visual_concept_details")
    pub name: String,

    /// JSON Schema document
    pub schema: serde_json::Value,
}

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "openai/gpt-4o", "google/gemini-2.5-pro")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Ask the backend for structured decoding against this schema.
    /// `None` means the reply comes back as raw text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<ResponseSchema>,
}

fn default_temperature() -> f32 {
    0.7
}

/// The body of a completion.
///
/// Which variant comes back depends on whether the request carried a
/// `response_schema` and whether the backend honoured it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Completion {
    /// The backend decoded and validated the reply itself.
    Structured(serde_json::Value),
    /// Plain reply text that still needs parsing.
    RawText(String),
}

impl Completion {
    /// A short preview of the reply, for log lines and diagnostics.
    pub fn preview(&self, limit: usize) -> String {
        let text = match self {
            Self::Structured(value) => value.to_string(),
            Self::RawText(text) => text.clone(),
        };
        if text.chars().count() <= limit {
            return text;
        }
        let truncated: String = text.chars().take(limit).collect();
        format!("{truncated}...")
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The reply body
    pub completion: Completion,

    /// Token usage statistics, when the backend reports them
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The adaptation stage calls `complete()` without knowing which backend
/// is in use. Retries, timeouts and model routing belong to the
/// implementation, never to the caller.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults() {
        let req: ProviderRequest = serde_json::from_str(r#"{"model":"gpt-4o","messages":[]}"#).unwrap();
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
        assert!(req.response_schema.is_none());
    }

    #[test]
    fn response_schema_is_omitted_when_absent() {
        let req = ProviderRequest {
            model: "gpt-4o".into(),
            messages: vec![Message::user("hi")],
            temperature: 0.5,
            max_tokens: Some(100),
            response_schema: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("response_schema"));
        assert!(json.contains("max_tokens"));
    }

    #[test]
    fn completion_serializes_tagged() {
        let json = serde_json::to_string(&Completion::RawText("{}".into())).unwrap();
        assert_eq!(json, r#"{"kind":"raw_text","value":"{}"}"#);
    }

    #[test]
    fn completion_preview_truncates() {
        let completion = Completion::RawText("a".repeat(20));
        assert_eq!(completion.preview(5), "aaaaa...");
        assert_eq!(Completion::RawText("short".into()).preview(10), "short");
    }
}

//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, Fireworks AI,
//! and any endpoint exposing `/v1/chat/completions`.
//!
//! When a request carries a `response_schema`, the schema is sent as
//! `response_format: json_schema` and the reply content is decoded into
//! [`Completion::Structured`]. Without one, the reply is returned as
//! [`Completion::RawText`] for the caller to parse.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stylecraft_core::error::ProviderError;
use stylecraft_core::message::Message;
use stylecraft_core::provider::*;
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    /// Build the request body for a chat completion.
    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let Some(schema) = &request.response_schema {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema,
                    "strict": false,
                }
            });
        }

        body
    }

    /// Turn the reply content into a completion body.
    ///
    /// Structured decoding was requested but the backend may still hand back
    /// text it could not validate; that text is passed through as raw.
    fn decode_content(content: String, structured: bool) -> Completion {
        if !structured {
            return Completion::RawText(content);
        }
        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(value) if value.is_object() => Completion::Structured(value),
            _ => {
                warn!("Structured output requested but reply was not a JSON object; returning raw text");
                Completion::RawText(content)
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request);
        let structured = request.response_schema.is_some();

        debug!(
            provider = %self.name,
            model = %request.model,
            structured,
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        if choice.finish_reason.as_deref() == Some("length") {
            warn!(model = %api_response.model, "Completion stopped at the max_tokens limit");
        }

        let content = choice.message.content.unwrap_or_default();
        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            completion: Self::decode_content(content, structured),
            usage,
            model: api_response.model,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(schema: Option<ResponseSchema>) -> ProviderRequest {
        ProviderRequest {
            model: "openai/gpt-4o".into(),
            messages: vec![Message::system("rules"), Message::user("adapt")],
            temperature: 0.5,
            max_tokens: Some(4096),
            response_schema: schema,
        }
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let provider = OpenAiCompatProvider::new("custom", "http://host/v1/", "k");
        assert_eq!(provider.base_url, "http://host/v1");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn body_without_schema_has_no_response_format() {
        let body = OpenAiCompatProvider::build_body(&request(None));
        assert!(body.get("response_format").is_none());
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["messages"][1]["content"], "adapt");
    }

    #[test]
    fn body_with_schema_requests_json_schema() {
        let schema = ResponseSchema {
            name: "visual_concept_details".into(),
            schema: serde_json::json!({"type": "object"}),
        };
        let body = OpenAiCompatProvider::build_body(&request(Some(schema)));
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(
            body["response_format"]["json_schema"]["name"],
            "visual_concept_details"
        );
    }

    #[test]
    fn decode_structured_object() {
        let completion = OpenAiCompatProvider::decode_content(r#"{"a":"b"}"#.into(), true);
        assert_eq!(
            completion,
            Completion::Structured(serde_json::json!({"a": "b"}))
        );
    }

    #[test]
    fn decode_falls_back_to_raw_text() {
        let completion = OpenAiCompatProvider::decode_content("not json".into(), true);
        assert_eq!(completion, Completion::RawText("not json".into()));

        let completion = OpenAiCompatProvider::decode_content(r#"{"a":"b"}"#.into(), false);
        assert!(matches!(completion, Completion::RawText(_)));
    }

    #[test]
    fn parse_api_response() {
        let data = r#"{
            "model": "openai/gpt-4o",
            "choices": [{"message": {"role": "assistant", "content": "{}"}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].finish_reason.as_deref(), Some("length"));
        assert_eq!(parsed.usage.unwrap().total_tokens, 15);
    }
}

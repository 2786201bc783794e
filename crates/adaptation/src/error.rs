//! Error types of the adaptation stage.

use stylecraft_core::provider::Completion;
use thiserror::Error;

use crate::extract::ExtractError;

/// Characters of raw model output kept in diagnostics.
pub const RAW_PREVIEW_CHARS: usize = 500;

/// Why a style adaptation failed.
#[derive(Debug, Error)]
pub enum AdaptationError {
    /// Missing schema, empty recipe, or no LLM client.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The reply was cut off, most likely at the response-size ceiling.
    #[error("response truncated at max_tokens={max_tokens}: {reason}")]
    TruncatedResponse {
        max_tokens: u32,
        reason: String,
        raw: String,
    },

    /// The reply held no usable object, or the object broke the schema.
    #[error("could not extract visual concept: {reason}")]
    Extraction { reason: String, raw: String },

    /// The call itself failed: network, provider status, or worker crash.
    #[error("LLM call failed: {0}")]
    Transport(String),
}

/// Coarse failure class reported to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Config,
    Llm,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Llm => write!(f, "llm"),
        }
    }
}

impl AdaptationError {
    /// Map an extractor error, attaching the configured response ceiling.
    pub fn from_extract(err: ExtractError, max_tokens: u32) -> Self {
        match err {
            ExtractError::Truncated { reason, raw } => Self::TruncatedResponse {
                max_tokens,
                reason,
                raw,
            },
            ExtractError::Extraction { reason, raw } => Self::Extraction { reason, raw },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Configuration(_) => FailureKind::Config,
            _ => FailureKind::Llm,
        }
    }

    /// Human-readable message written to the run's `stage_error`.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Configuration(message) => {
                format!("Style adaptation is misconfigured: {message}")
            }
            Self::TruncatedResponse {
                max_tokens,
                reason,
                raw,
            } => format!(
                "Style adaptation response was truncated ({reason}). The model likely hit the \
                 max_tokens limit of {max_tokens}; raise `adaptation.max_tokens` and retry. \
                 Raw response preview: {}",
                preview(raw)
            ),
            Self::Extraction { reason, raw } => format!(
                "Style adaptation could not parse the model response ({reason}). \
                 Raw response preview: {}",
                preview(raw)
            ),
            Self::Transport(message) => format!("Style adaptation LLM call failed: {message}"),
        }
    }
}

fn preview(raw: &str) -> String {
    Completion::RawText(raw.to_string()).preview(RAW_PREVIEW_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_diagnostic_names_the_ceiling() {
        let err = AdaptationError::from_extract(
            ExtractError::Truncated {
                reason: "response ends inside a string value".into(),
                raw: "{\"main_subject\": \"A cu".into(),
            },
            4096,
        );
        let message = err.diagnostic();
        assert!(message.contains("4096"));
        assert!(message.contains("adaptation.max_tokens"));
        assert!(message.contains("{\"main_subject\": \"A cu"));
        assert_eq!(err.kind(), FailureKind::Llm);
    }

    #[test]
    fn raw_preview_is_capped() {
        let err = AdaptationError::Extraction {
            reason: "no JSON object found in response".into(),
            raw: "x".repeat(2000),
        };
        let message = err.diagnostic();
        assert!(message.len() < 800);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn configuration_is_its_own_kind() {
        let err = AdaptationError::Configuration("style recipe is empty".into());
        assert_eq!(err.kind(), FailureKind::Config);
        assert!(err.diagnostic().contains("style recipe is empty"));
    }
}

//! Transport error types.
//!
//! Each bounded context has its own error enum; this one belongs to the
//! [`Provider`](crate::provider::Provider) seam.

use thiserror::Error;

/// Failures raised by an LLM transport.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_status_and_message() {
        let err = ProviderError::ApiError {
            status_code: 502,
            message: "Bad gateway".into(),
        };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("Bad gateway"));
    }

    #[test]
    fn timeout_keeps_its_detail() {
        let err = ProviderError::Timeout("after 120s".into());
        assert_eq!(err.to_string(), "Request timed out: after 120s");
    }
}

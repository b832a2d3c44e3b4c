//! LLM error types.

use thiserror::Error;

/// Errors that can occur when interacting with LLM providers.
#[derive(Error, Debug)]
pub enum LLMError {
    /// API error from the provider
    #[error("API error: {0}")]
    ApiError(String),

    /// Network/connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// Empty response from provider
    #[error("Empty response from LLM")]
    EmptyResponse,

    /// Invalid response format
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LLMError {
    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Authentication and configuration failures are permanent; everything
    /// else is treated as transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            LLMError::AuthenticationError(_) | LLMError::ConfigError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LLMError::Timeout.is_retryable());
        assert!(LLMError::ConnectionError("reset".into()).is_retryable());
        assert!(LLMError::RateLimitError("429".into()).is_retryable());
        assert!(!LLMError::AuthenticationError("bad key".into()).is_retryable());
        assert!(!LLMError::ConfigError("no model".into()).is_retryable());
    }
}

//! Error types for trawl-ai

use thiserror::Error;

/// Result type alias using trawl-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to a model provider
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {message} (type: {error_type})")]
    Api { error_type: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limited: retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Invalid API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// Server-sent events error
    #[error("SSE error: {0}")]
    Sse(String),

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an API error from type and message
    pub fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Map an HTTP status and body from the provider into an error
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Error::InvalidApiKey,
            429 => Error::RateLimited { retry_after: None },
            _ => Error::api(format!("http_{}", status), body),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Sse(_) => true,
            Error::Api {
                error_type,
                message,
            } => {
                let et = error_type.to_lowercase();
                let msg = message.to_lowercase();
                et.contains("rate_limit")
                    || et.contains("overloaded")
                    || et.starts_with("http_5")
                    || msg.contains("rate limit")
                    || msg.contains("overloaded")
                    || msg.contains("too many requests")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_typed_variants() {
        assert!(Error::RateLimited { retry_after: Some(5) }.is_retryable());
        assert!(Error::Sse("connection reset".into()).is_retryable());
    }

    #[test]
    fn test_retryable_api_rate_limit_error_type() {
        let e = Error::api("rate_limit_error", "You have exceeded the rate limit");
        assert!(e.is_retryable());
    }

    #[test]
    fn test_retryable_api_overloaded_message() {
        let e = Error::api("server_error", "API is overloaded right now");
        assert!(e.is_retryable());
    }

    #[test]
    fn test_retryable_server_status() {
        assert!(Error::from_status(503, "unavailable").is_retryable());
        assert!(Error::from_status(429, "slow down").is_retryable());
    }

    #[test]
    fn test_not_retryable_auth() {
        assert!(matches!(Error::from_status(401, ""), Error::InvalidApiKey));
        assert!(!Error::from_status(401, "").is_retryable());
        assert!(!Error::from_status(400, "bad request").is_retryable());
    }

    #[test]
    fn test_not_retryable_non_api() {
        assert!(!Error::InvalidApiKey.is_retryable());
        assert!(!Error::InvalidConfig("no model".into()).is_retryable());
        assert!(!Error::UnexpectedResponse("empty".into()).is_retryable());
    }
}

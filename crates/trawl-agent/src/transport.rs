//! Transport abstraction for model calls

use std::{sync::Arc, sync::LazyLock, time::Duration};

use async_trait::async_trait;
use regex::Regex;
use trawl_ai::{
    Context, Message, Model, Result,
    providers::{LlmProvider, openai::OpenAIProvider},
    stream::collect_message,
};

/// Backoff between re-invocations of a failed reasoning step
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No delay at all between retries
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Transient failures worth another attempt: rate limits, timeouts,
/// dropped connections, 5xx responses and overload notices.
static RETRYABLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b429\b",
        r"(?i)rate.?limit",
        r"(?i)timed?.?out",
        r"(?i)connection",
        r"\b50[0234]\b",
        r"(?i)overloaded",
        r"(?i)temporarily unavailable",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Check if an error message describes a transient failure
pub fn is_retryable_error(error: &str) -> bool {
    RETRYABLE_PATTERNS.iter().any(|re| re.is_match(error))
}

/// One blocking model call: context in, assistant message out.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn complete(&self, model: &Model, context: &Context) -> Result<Message>;
}

/// Direct provider transport - calls the chat-completions API and collects
/// the streamed reply into one message
pub struct ProviderTransport {
    provider: Arc<dyn LlmProvider>,
}

impl ProviderTransport {
    /// Create a transport over any provider
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Create an OpenAI-compatible transport with a specific API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(Arc::new(OpenAIProvider::new(api_key)))
    }
}

#[async_trait]
impl Transport for ProviderTransport {
    async fn complete(&self, model: &Model, context: &Context) -> Result<Message> {
        let stream = self.provider.stream(model, context).await?;
        collect_message(stream).await
    }
}

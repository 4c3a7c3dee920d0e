//! Error types for trawl-agent

use thiserror::Error;

use crate::transport::is_retryable_error;

/// Result type alias using trawl-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Run-level failures. Each one ends the run it occurs in.
#[derive(Error, Debug)]
pub enum Error {
    /// The reasoning call failed at the transport or provider level
    #[error("Model unavailable: {source}")]
    ModelUnavailable {
        #[source]
        source: trawl_ai::Error,
        /// Whether re-invoking the reasoning step may succeed
        retryable: bool,
    },

    /// The loop ran out of iterations without seeing the terminal marker
    #[error("Iteration limit exceeded: no terminal marker after {limit} iterations")]
    IterationLimitExceeded { limit: u32 },

    /// The router was configured to reject content it cannot classify
    #[error("Malformed termination content: {0}")]
    MalformedTermination(String),
}

impl Error {
    /// Wrap a provider error, classifying whether a retry makes sense
    pub fn model_unavailable(source: trawl_ai::Error) -> Self {
        let retryable = match &source {
            // Only untyped failures are classified by their message text
            trawl_ai::Error::UnexpectedResponse(message) => is_retryable_error(message),
            typed => typed.is_retryable(),
        };
        Error::ModelUnavailable { source, retryable }
    }

    /// Check if the loop may re-invoke the reasoning step after this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ModelUnavailable { retryable: true, .. })
    }
}

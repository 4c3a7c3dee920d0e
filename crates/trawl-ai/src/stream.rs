//! Streaming event types and utilities

use crate::error::{Error, Result};
use crate::types::{Message, StopReason, Usage};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted during message streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEvent {
    /// Initial message structure
    Start { message: Message },
    /// Text content delta
    TextDelta { delta: String },
    /// Tool call started
    ToolCallStart {
        index: usize,
        id: String,
        name: String,
    },
    /// Tool call arguments delta (partial JSON)
    ToolCallDelta { index: usize, delta: String },
    /// Message completed successfully
    Done {
        message: Message,
        stop_reason: StopReason,
        usage: Usage,
    },
    /// Error occurred
    Error {
        message: String,
        /// HTTP status when the provider rejected the request
        #[serde(default)]
        status: Option<u16>,
    },
}

impl MessageEvent {
    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageEvent::Done { .. } | MessageEvent::Error { .. })
    }
}

/// A stream of message events
pub type MessageEventStream = Pin<Box<dyn Stream<Item = MessageEvent> + Send>>;

/// Drain a stream until its terminal event and return the finished message.
pub async fn collect_message(mut stream: MessageEventStream) -> Result<Message> {
    while let Some(event) = stream.next().await {
        match event {
            MessageEvent::Done { message, .. } => return Ok(message),
            MessageEvent::Error {
                message,
                status: Some(status),
            } => return Err(Error::from_status(status, message)),
            MessageEvent::Error { message, .. } => return Err(Error::Sse(message)),
            MessageEvent::TextDelta { delta } => {
                tracing::trace!(len = delta.len(), "text delta");
            }
            _ => {}
        }
    }
    Err(Error::UnexpectedResponse(
        "stream ended without a final message".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_returns_done_message() {
        let stream: MessageEventStream = Box::pin(async_stream::stream! {
            yield MessageEvent::TextDelta { delta: "EN".into() };
            yield MessageEvent::TextDelta { delta: "D".into() };
            yield MessageEvent::Done {
                message: Message::assistant("END"),
                stop_reason: StopReason::Stop,
                usage: Usage::default(),
            };
        });
        let message = collect_message(stream).await.unwrap();
        assert_eq!(message.text(), "END");
    }

    #[tokio::test]
    async fn test_collect_surfaces_stream_error() {
        let stream: MessageEventStream = Box::pin(async_stream::stream! {
            yield MessageEvent::Error { message: "SSE error: reset".into(), status: None };
        });
        let err = collect_message(stream).await.unwrap_err();
        assert!(matches!(err, Error::Sse(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_collect_maps_http_status() {
        let stream: MessageEventStream = Box::pin(async_stream::stream! {
            yield MessageEvent::Error { message: "unauthorized".into(), status: Some(401) };
        });
        let err = collect_message(stream).await.unwrap_err();
        assert!(matches!(err, Error::InvalidApiKey));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_collect_truncated_stream() {
        let stream: MessageEventStream = Box::pin(async_stream::stream! {
            yield MessageEvent::TextDelta { delta: "partial".into() };
        });
        let err = collect_message(stream).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }

    #[test]
    fn test_terminal_events() {
        assert!(MessageEvent::Error { message: "x".into(), status: None }.is_terminal());
        assert!(!MessageEvent::TextDelta { delta: "x".into() }.is_terminal());
    }
}

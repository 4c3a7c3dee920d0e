//! trawl-ai: message model and chat-completions provider
//!
//! This crate defines the conversation data model shared by the agent and
//! the client used to talk to an OpenAI-compatible chat-completions endpoint.

pub mod error;
pub mod providers;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use stream::MessageEventStream;
pub use types::*;

//! Transcript: the ordered, append-only conversation of one run.

use trawl_ai::{Message, ToolCall};

/// Ordered message history for a single run.
///
/// The only mutation is [`Transcript::append`]; entries are never edited,
/// reordered or removed once added.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript holding a single seed user message
    pub fn seeded(seed: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.append(Message::user(seed.into()));
        transcript
    }

    /// Add a message to the end and return it
    pub fn append(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// The most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The full ordered sequence
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Tool calls carried by the latest message, if any
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        self.last().map(Message::tool_calls).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_preserves_prefix() {
        let mut transcript = Transcript::seeded("https://example.com/start");
        let mut snapshots = vec![transcript.all().to_vec()];

        transcript.append(Message::assistant("thinking"));
        snapshots.push(transcript.all().to_vec());
        transcript.append(Message::assistant("END"));
        snapshots.push(transcript.all().to_vec());

        for pair in snapshots.windows(2) {
            let (before, after) = (&pair[0], &pair[1]);
            assert_eq!(after.len(), before.len() + 1);
            assert_eq!(&after[..before.len()], before.as_slice());
        }
    }

    #[test]
    fn test_append_returns_new_entry() {
        let mut transcript = Transcript::new();
        let appended = transcript.append(Message::assistant("hi"));
        assert_eq!(appended.text(), "hi");
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_last_and_pending_tool_calls() {
        let mut transcript = Transcript::new();
        assert!(transcript.last().is_none());
        assert!(transcript.pending_tool_calls().is_empty());

        transcript.append(Message::user("https://example.com"));
        transcript.append(Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("a", "get_rendered_html", json!({"url": "https://example.com"}))],
        ));
        assert_eq!(transcript.pending_tool_calls().len(), 1);

        transcript.append(Message::tool_output("a", "get_rendered_html", json!({"status": 200})));
        assert!(transcript.pending_tool_calls().is_empty());
        assert_eq!(transcript.last().and_then(Message::tool_call_id), Some("a"));
    }

    #[test]
    fn test_seeded_holds_user_message() {
        let transcript = Transcript::seeded("https://example.com/quiz");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.all()[0].role(), trawl_ai::Role::User);
        assert_eq!(transcript.all()[0].text(), "https://example.com/quiz");
    }
}

//! Transcript messages.

use crate::content::ContentBlock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Position in the session, starting at 1.
    pub id: u64,
    pub role: Role,
    pub content: Vec<ContentBlock>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Concatenated text blocks, ignoring tool blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Append-only, ordered list of messages.
///
/// Messages cannot be modified or removed once pushed.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return a copy of it.
    pub fn push(&mut self, role: Role, content: Vec<ContentBlock>) -> Message {
        let message = Message {
            id: self.messages.len() as u64 + 1,
            role,
            content,
            timestamp: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended after the first `count`.
    pub fn since(&self, count: usize) -> &[Message] {
        &self.messages[count.min(self.messages.len())..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut transcript = Transcript::new();
        let first = transcript.push(Role::Assistant, vec![ContentBlock::text("hi")]);
        let second = transcript.push(Role::User, vec![ContentBlock::text("hello")]);
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(first.timestamp <= second.timestamp);
    }

    #[test]
    fn test_since() {
        let mut transcript = Transcript::new();
        transcript.push(Role::Assistant, vec![ContentBlock::text("a")]);
        transcript.push(Role::User, vec![ContentBlock::text("b")]);
        assert_eq!(transcript.since(1).len(), 1);
        assert_eq!(transcript.since(5).len(), 0);
    }

    #[test]
    fn test_message_text_skips_tool_blocks() {
        let mut transcript = Transcript::new();
        let message = transcript.push(
            Role::Assistant,
            vec![
                ContentBlock::ToolUse {
                    id: "1".to_string(),
                    name: "getLocation".to_string(),
                    input: serde_json::json!({"query": "Tokyo"}),
                },
                ContentBlock::text("It is sunny."),
            ],
        );
        assert_eq!(message.text(), "It is sunny.");
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}

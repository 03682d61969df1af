//! Session data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::relay::WireMessage;

/// Title given to every freshly created session
pub const DEFAULT_TITLE: &str = "New Chat";

const TITLE_MAX_WORDS: usize = 6;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        f.write_str(name)
    }
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id
    pub id: String,
    /// Message role
    pub role: Role,
    /// Message content
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message stamped with a fresh id and the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Convert to wire format (role and content only)
    pub fn to_wire(&self) -> WireMessage {
        WireMessage::new(self.role, self.content.clone())
    }
}

/// A conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session id
    pub id: String,
    /// Display title
    pub title: String,
    /// Messages in order of arrival
    pub messages: Vec<Message>,
    /// Last time the session was written to
    pub last_updated: DateTime<Utc>,
}

impl ChatSession {
    /// Create an empty session titled "New Chat"
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// True when no message has been sent in this session yet
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a session title from the first user message.
///
/// Up to six words are kept verbatim; longer text keeps the first six
/// words followed by "...".
pub fn derive_title(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= TITLE_MAX_WORDS {
        return text.to_string();
    }
    format!("{}...", words[..TITLE_MAX_WORDS].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = ChatSession::new();
        assert_eq!(session.title, "New Chat");
        assert!(session.is_empty());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = ChatSession::new();
        let b = ChatSession::new();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_derive_title_short() {
        assert_eq!(derive_title("Hello"), "Hello");
        assert_eq!(derive_title("one two three four five six"), "one two three four five six");
    }

    #[test]
    fn test_derive_title_long() {
        assert_eq!(
            derive_title("one two three four five six seven"),
            "one two three four five six..."
        );
    }

    #[test]
    fn test_derive_title_collapses_extra_whitespace_when_truncating() {
        assert_eq!(
            derive_title("a  b\tc\nd e f g h"),
            "a b c d e f..."
        );
    }

    #[test]
    fn test_message_to_wire_drops_metadata() {
        let msg = Message::new(Role::Assistant, "Hi there!");
        let wire = msg.to_wire();
        assert_eq!(wire.role, Role::Assistant);
        assert_eq!(wire.content, "Hi there!");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
        assert_eq!(Role::User.to_string(), "user");
    }
}

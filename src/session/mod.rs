//! Conversation session state: the append-only message log and the bounded
//! context window derived from it.
//!
//! [`ConversationSession`] is the root aggregate, owned exclusively by the
//! engine for the lifetime of one chat surface instance.  Messages are
//! appended on every completed turn and cleared only by explicit user
//! action.  [`SessionStore`](store::SessionStore) persists the session across
//! page navigation within the same browsing session.

pub mod store;

pub use store::{JsonSessionStore, SessionStore};

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Role / Message
// ---------------------------------------------------------------------------

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One turn's worth of text.  Immutable once appended.
///
/// `display_text` is what the chat surface shows (directive markers
/// stripped); `raw_text` is the original generated text with markers
/// retained, kept for audit/debug.  For user messages the two are identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub display_text: String,
    pub raw_text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl Message {
    /// Build a user message (display and raw text are the same).
    pub fn user(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            role: Role::User,
            display_text: text.clone(),
            raw_text: text,
            timestamp_ms: now_ms(),
        }
    }

    /// Build an assistant message from the stripped display text and the
    /// original raw text.
    pub fn assistant(display_text: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            display_text: display_text.into(),
            raw_text: raw_text.into(),
            timestamp_ms: now_ms(),
        }
    }
}

/// Current wall-clock time as epoch milliseconds.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// ConversationSession
// ---------------------------------------------------------------------------

/// The append-only conversation log for one chat surface instance.
///
/// ```
/// use voice_agent::session::{ConversationSession, Message};
///
/// let mut session = ConversationSession::new("default");
/// session.push(Message::user("hello"));
/// session.push(Message::assistant("hi there", "hi there"));
/// assert_eq!(session.messages().len(), 2);
/// assert_eq!(session.context_window(1).len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    messages: Vec<Message>,
}

impl ConversationSession {
    /// Create an empty session.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }

    /// Append a message.  Insertion order is chronological and semantic.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The full message log, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The derived last-`k` view used to build generation prompts.
    ///
    /// Recomputed on every call — never stored separately.
    pub fn context_window(&self, k: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(k);
        &self.messages[start..]
    }

    /// Wipe the log.  Only ever invoked by an explicit user action.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let session = ConversationSession::new("s1");
        assert!(session.is_empty());
        assert!(session.context_window(5).is_empty());
    }

    #[test]
    fn push_preserves_insertion_order() {
        let mut session = ConversationSession::new("s1");
        session.push(Message::user("first"));
        session.push(Message::assistant("second", "second"));
        session.push(Message::user("third"));

        let texts: Vec<&str> = session
            .messages()
            .iter()
            .map(|m| m.display_text.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn context_window_returns_last_k() {
        let mut session = ConversationSession::new("s1");
        for i in 0..10 {
            session.push(Message::user(format!("msg{i}")));
        }

        let window = session.context_window(3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].display_text, "msg7");
        assert_eq!(window[2].display_text, "msg9");
    }

    #[test]
    fn context_window_larger_than_log_returns_all() {
        let mut session = ConversationSession::new("s1");
        session.push(Message::user("only"));
        assert_eq!(session.context_window(100).len(), 1);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut session = ConversationSession::new("s1");
        session.push(Message::user("bye"));
        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn user_message_display_equals_raw() {
        let msg = Message::user("hello there");
        assert_eq!(msg.display_text, msg.raw_text);
        assert_eq!(msg.role, Role::User);
    }

    #[test]
    fn assistant_message_keeps_both_texts() {
        let msg = Message::assistant("go to pricing", "go to pricing [[navigate:/pricing]]");
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.raw_text.contains("[[navigate:"));
        assert!(!msg.display_text.contains("[[navigate:"));
    }

    #[test]
    fn timestamps_are_monotonic_enough() {
        let a = Message::user("a");
        let b = Message::user("b");
        assert!(b.timestamp_ms >= a.timestamp_ms);
    }
}

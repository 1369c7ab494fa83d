//! Conversation and message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::core::ids::{ConversationId, MessageId};

/// Suffix appended to a title cut at the character limit.
pub const TITLE_ELLIPSIS: char = '…';

/// Fallback label used when a conversation title cannot be resolved.
pub const FALLBACK_TITLE: &str = "Conversation";

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The human at the composer.
    User,
    /// The simulated assistant.
    Assistant,
}

impl Sender {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single chat message. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Message body, verbatim.
    pub text: String,
    /// Author.
    pub sender: Sender,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with a fresh id.
    #[must_use]
    pub fn new(text: impl Into<String>, sender: Sender, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            sender,
            timestamp,
        }
    }

    /// Create a user message stamped `now`.
    #[must_use]
    pub fn user(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(text, Sender::User, now)
    }

    /// Create an assistant message stamped `now`.
    #[must_use]
    pub fn assistant(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(text, Sender::Assistant, now)
    }
}

/// A titled, ordered sequence of messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier.
    pub id: ConversationId,
    /// Title derived from the first message; fixed at creation.
    pub title: String,
    /// Messages in insertion order.
    pub messages: Vec<Message>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time a message was appended.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Start a conversation from its first message.
    #[must_use]
    pub fn start(first: Message, title_max_chars: usize) -> Self {
        let title = derive_title(&first.text, title_max_chars);
        let now = first.timestamp;
        Self {
            id: ConversationId::new(),
            title,
            messages: vec![first],
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message and refresh `updated_at`.
    pub fn push(&mut self, message: Message) {
        self.updated_at = message.timestamp;
        self.messages.push(message);
    }

    /// Most recent message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Case-insensitive substring match on the title.
    #[must_use]
    pub fn title_matches(&self, needle_lowercase: &str) -> bool {
        needle_lowercase.is_empty() || self.title.to_lowercase().contains(needle_lowercase)
    }
}

/// Build a conversation title from the first message.
///
/// Keeps the first `max_chars` characters and appends `…` only when the text
/// was longer than that.
#[must_use]
pub fn derive_title(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let mut title: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        title.push(TITLE_ELLIPSIS);
    }
    title
}

/// Body of the simulated assistant reply for a user message.
#[must_use]
pub fn simulated_reply(user_text: &str) -> String {
    format!("I'm a demo AI assistant. This is a simulated response to your message: \"{user_text}\"")
}

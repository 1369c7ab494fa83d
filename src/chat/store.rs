//! In-memory conversation store.
//!
//! Holds every conversation (newest-created first), the active conversation
//! reference and the typing indicator. All transitions are plain methods on
//! `&mut self`; timers and locking live in [`crate::chat::service`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::chat::core::config::{ChatConfig, ReplyTargeting};
use crate::chat::core::ids::{ConversationId, MessageId};
use crate::chat::types::{Conversation, Message};

/// Store shared between the service and the reply tasks.
pub type SharedStore = Arc<RwLock<ConversationStore>>;

/// Where a simulated reply should be appended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReplyTarget {
    /// The conversation with this id, if it still exists.
    Conversation(ConversationId),
    /// Whatever conversation is at list position 0.
    Front,
}

/// Outcome of a recorded user message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SendReceipt {
    /// Conversation the message was appended to.
    pub conversation_id: ConversationId,
    /// Id of the recorded user message.
    pub message_id: MessageId,
    /// Whether the send created the conversation.
    pub created: bool,
    /// Where the simulated reply will land.
    pub reply_target: ReplyTarget,
    /// The user text, verbatim.
    pub text: String,
}

/// Registry of conversations and the active reference.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    pending_replies: usize,
    title_max_chars: usize,
    reply_targeting: ReplyTargeting,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(&ChatConfig::default())
    }
}

impl ConversationStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new(config: &ChatConfig) -> Self {
        Self {
            conversations: Vec::new(),
            active: None,
            pending_replies: 0,
            title_max_chars: config.title_max_chars,
            reply_targeting: config.reply_targeting,
        }
    }

    /// Wrap the store for sharing with reply tasks.
    #[must_use]
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// Record a user message against the active conversation.
    ///
    /// Whitespace-only text is ignored and returns `None`. When no active
    /// conversation resolves, a new one is created at the front of the list
    /// and becomes active.
    pub fn send_message(&mut self, text: &str, now: DateTime<Utc>) -> Option<SendReceipt> {
        if text.trim().is_empty() {
            return None;
        }

        let message = Message::user(text, now);
        let message_id = message.id;

        if let Some(conversation) = self.active_conversation_mut() {
            conversation.push(message);
            let conversation_id = conversation.id;
            return Some(SendReceipt {
                conversation_id,
                message_id,
                created: false,
                reply_target: ReplyTarget::Conversation(conversation_id),
                text: text.to_string(),
            });
        }

        let conversation = Conversation::start(message, self.title_max_chars);
        let conversation_id = conversation.id;
        self.conversations.insert(0, conversation);
        self.active = Some(conversation_id);

        let reply_target = match self.reply_targeting {
            ReplyTargeting::ById => ReplyTarget::Conversation(conversation_id),
            ReplyTargeting::FrontOfList => ReplyTarget::Front,
        };

        Some(SendReceipt {
            conversation_id,
            message_id,
            created: true,
            reply_target,
            text: text.to_string(),
        })
    }

    /// Append an assistant message to the reply target.
    ///
    /// Returns the conversation that received it, or `None` if the target no
    /// longer resolves.
    pub fn append_reply(
        &mut self,
        target: ReplyTarget,
        message: Message,
    ) -> Option<ConversationId> {
        let conversation = match target {
            ReplyTarget::Conversation(id) => self.get_mut(id)?,
            ReplyTarget::Front => self.conversations.first_mut()?,
        };
        conversation.push(message);
        Some(conversation.id)
    }

    /// Mark one more reply as pending.
    pub const fn begin_reply(&mut self) {
        self.pending_replies += 1;
    }

    /// Mark a pending reply as settled (delivered or cancelled).
    pub const fn finish_reply(&mut self) {
        self.pending_replies = self.pending_replies.saturating_sub(1);
    }

    /// Whether the assistant is "typing" (at least one reply pending).
    #[must_use]
    pub const fn is_typing(&self) -> bool {
        self.pending_replies > 0
    }

    /// Number of pending replies.
    #[must_use]
    pub const fn pending_replies(&self) -> usize {
        self.pending_replies
    }

    /// Remove a conversation.
    ///
    /// Clears the active reference if it pointed at the removed conversation.
    /// Unknown ids are a no-op.
    pub fn delete_conversation(&mut self, id: ConversationId) -> Option<Conversation> {
        let index = self.conversations.iter().position(|c| c.id == id)?;
        let removed = self.conversations.remove(index);
        if self.active == Some(id) {
            self.active = None;
        }
        Some(removed)
    }

    /// Conversations whose title contains `search_term`, ignoring case.
    ///
    /// An empty term returns everything. Store order is preserved.
    #[must_use]
    pub fn filter_conversations(&self, search_term: &str) -> Vec<&Conversation> {
        let needle = search_term.to_lowercase();
        self.conversations
            .iter()
            .filter(|c| c.title_matches(&needle))
            .collect()
    }

    /// Set or clear the active conversation.
    ///
    /// Returns `false` (and changes nothing) when `id` is unknown.
    pub fn select_conversation(&mut self, id: Option<ConversationId>) -> bool {
        match id {
            None => {
                self.active = None;
                true
            }
            Some(id) if self.contains(id) => {
                self.active = Some(id);
                true
            }
            Some(_) => false,
        }
    }

    /// The active conversation id, if any.
    #[must_use]
    pub const fn active_id(&self) -> Option<ConversationId> {
        self.active
    }

    /// Resolve the active conversation.
    #[must_use]
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active.and_then(|id| self.get(id))
    }

    fn active_conversation_mut(&mut self) -> Option<&mut Conversation> {
        let id = self.active?;
        self.get_mut(id)
    }

    /// Look up a conversation by id.
    #[must_use]
    pub fn get(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// Whether a conversation with this id exists.
    #[must_use]
    pub fn contains(&self, id: ConversationId) -> bool {
        self.get(id).is_some()
    }

    /// All conversations, newest-created first.
    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Number of conversations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the store holds no conversations.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

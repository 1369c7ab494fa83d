//! Conversation engine.
//!
//! An in-memory store of conversations, a simulated assistant that answers
//! every user message after a fixed delay, confirmed deletion and title
//! search.

pub mod composer;
pub mod confirm;
pub mod core;
pub mod notify;
pub mod replies;
pub mod service;
pub mod store;
pub mod types;
pub mod view;

pub use composer::Composer;
pub use confirm::{Decision, DeleteConfirmation, DeleteDialog, FixedDecision};
pub use self::core::{
    ChatConfig, ChatConfigBuilder, ChatError, ChatResult, ConversationId, MessageId, ReplyTargeting,
};
pub use notify::{Notification, NotificationLog, Notifier};
pub use replies::{ReplyOutcome, ReplyScheduler};
pub use service::{ChatService, DeletionReport, SentMessage, StoreSnapshot};
pub use store::{ConversationStore, ReplyTarget, SendReceipt, SharedStore};
pub use types::{Conversation, Message, Sender};
pub use view::{ConversationSummary, KeyPress, MessageView};

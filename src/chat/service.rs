//! Chat service: the façade front-ends talk to.
//!
//! Wraps the shared store, the reply scheduler, the deletion dialog and the
//! notification sink.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::chat::confirm::{Decision, DeleteConfirmation, DeleteDialog};
use crate::chat::core::config::ChatConfig;
use crate::chat::core::ids::ConversationId;
use crate::chat::notify::Notifier;
use crate::chat::replies::{ReplyOutcome, ReplyScheduler};
use crate::chat::store::{ConversationStore, SendReceipt, SharedStore};
use crate::chat::types::{Conversation, FALLBACK_TITLE};

/// Headline of the notification emitted after a deletion.
pub const DELETED_NOTIFICATION_TITLE: &str = "Chat deleted";

/// A recorded user message plus the handle of its pending reply.
#[derive(Debug)]
pub struct SentMessage {
    /// What was recorded.
    pub receipt: SendReceipt,
    /// Resolves once the simulated reply lands or is cancelled.
    pub reply: JoinHandle<ReplyOutcome>,
}

/// Result of a resolved deletion request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// Conversation the request was about.
    pub conversation_id: ConversationId,
    /// Confirmed or cancelled.
    pub decision: Decision,
    /// Whether a conversation was actually removed.
    pub removed: bool,
    /// Title shown in the notification (fallback when unresolved).
    pub title: String,
    /// Pending replies cancelled by the removal.
    pub cancelled_replies: usize,
}

/// Point-in-time copy of the store state for rendering.
#[derive(Clone, Debug, Serialize)]
pub struct StoreSnapshot {
    /// All conversations, newest-created first.
    pub conversations: Vec<Conversation>,
    /// Active conversation id.
    pub active_id: Option<ConversationId>,
    /// Whether a reply is pending.
    pub is_typing: bool,
}

/// Conversation engine with simulated replies.
pub struct ChatService {
    store: SharedStore,
    replies: ReplyScheduler,
    dialog: DeleteDialog,
    notifier: Arc<dyn Notifier>,
    config: ChatConfig,
}

impl ChatService {
    /// Create a service with an empty store.
    #[must_use]
    pub fn new(config: ChatConfig, notifier: Arc<dyn Notifier>) -> Self {
        let store = ConversationStore::new(&config).into_shared();
        let replies = ReplyScheduler::new(config.reply_delay());
        info!(?config, "Chat service ready");
        Self {
            store,
            replies,
            dialog: DeleteDialog::new(),
            notifier,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Shared handle on the underlying store.
    #[must_use]
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Send a message to the active conversation (or a new one).
    ///
    /// Whitespace-only text is ignored and returns `None`.
    pub async fn send_message(&self, text: &str) -> Option<SentMessage> {
        let mut guard = self.store.write().await;
        let Some(receipt) = guard.send_message(text, Utc::now()) else {
            debug!("Ignoring blank message");
            return None;
        };

        if receipt.created {
            info!(conversation_id = %receipt.conversation_id, "Conversation created");
        }
        let reply = self.replies.schedule(&self.store, &mut guard, &receipt);
        Some(SentMessage { receipt, reply })
    }

    /// Delete a conversation after asking `confirmation`.
    pub async fn delete_conversation(
        &self,
        id: ConversationId,
        confirmation: &dyn DeleteConfirmation,
    ) -> DeletionReport {
        let title = self.title_of(id).await;
        let decision = confirmation.open(id, &title).await;
        self.finish_delete(id, decision).await
    }

    /// Open the deletion dialog for `id`.
    ///
    /// Returns the title the dialog should display.
    pub async fn request_delete(&self, id: ConversationId) -> String {
        if let Some(previous) = self.dialog.open(id) {
            debug!(%previous, "Replacing open deletion request");
        }
        self.title_of(id).await
    }

    /// Conversation awaiting confirmation, if any.
    #[must_use]
    pub fn pending_delete(&self) -> Option<ConversationId> {
        self.dialog.pending()
    }

    /// Confirm the open deletion request.
    ///
    /// Returns `None` when no request was open.
    pub async fn confirm_delete(&self) -> Option<DeletionReport> {
        let (id, decision) = self.dialog.resolve(Decision::Confirmed)?;
        Some(self.finish_delete(id, decision).await)
    }

    /// Cancel the open deletion request. The store is left untouched.
    pub async fn cancel_delete(&self) -> Option<DeletionReport> {
        let (id, decision) = self.dialog.resolve(Decision::Cancelled)?;
        Some(self.finish_delete(id, decision).await)
    }

    async fn finish_delete(&self, id: ConversationId, decision: Decision) -> DeletionReport {
        if !decision.is_confirmed() {
            debug!(conversation_id = %id, "Deletion cancelled");
            return DeletionReport {
                conversation_id: id,
                decision,
                removed: false,
                title: self.title_of(id).await,
                cancelled_replies: 0,
            };
        }

        let (removed, cancelled_replies) = {
            let mut guard = self.store.write().await;
            let removed = guard.delete_conversation(id);
            let cancelled = self.replies.cancel_for(&mut guard, id);
            (removed, cancelled)
        };

        let title = removed
            .as_ref()
            .map_or_else(|| FALLBACK_TITLE.to_string(), |c| c.title.clone());
        self.notifier.notify(
            DELETED_NOTIFICATION_TITLE,
            &format!("\"{title}\" has been deleted successfully."),
        );
        info!(conversation_id = %id, cancelled_replies, "Conversation deleted");

        DeletionReport {
            conversation_id: id,
            decision,
            removed: removed.is_some(),
            title,
            cancelled_replies,
        }
    }

    /// Conversations whose title contains `search_term`, ignoring case.
    pub async fn filter_conversations(&self, search_term: &str) -> Vec<Conversation> {
        self.store
            .read()
            .await
            .filter_conversations(search_term)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Set the active conversation, or clear it with `None` ("new chat").
    ///
    /// Returns `false` when `id` is unknown.
    pub async fn select_conversation(&self, id: Option<ConversationId>) -> bool {
        let selected = self.store.write().await.select_conversation(id);
        debug!(?id, selected, "Select conversation");
        selected
    }

    /// Copy of a single conversation.
    pub async fn conversation(&self, id: ConversationId) -> Option<Conversation> {
        self.store.read().await.get(id).cloned()
    }

    /// Copy of the full store state.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let guard = self.store.read().await;
        StoreSnapshot {
            conversations: guard.conversations().to_vec(),
            active_id: guard.active_id(),
            is_typing: guard.is_typing(),
        }
    }

    /// Whether a simulated reply is pending.
    pub async fn is_typing(&self) -> bool {
        self.store.read().await.is_typing()
    }

    /// Cancel all pending replies. Returns how many were cancelled.
    pub async fn shutdown(&self) -> usize {
        let mut guard = self.store.write().await;
        let cancelled = self.replies.cancel_all(&mut guard);
        info!(cancelled, "Chat service shut down");
        cancelled
    }

    async fn title_of(&self, id: ConversationId) -> String {
        self.store
            .read()
            .await
            .get(id)
            .map_or_else(|| FALLBACK_TITLE.to_string(), |c| c.title.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::chat::confirm::FixedDecision;
    use crate::chat::core::config::{ChatConfigBuilder, ReplyTargeting};
    use crate::chat::notify::NotificationLog;
    use crate::chat::types::Sender;

    fn service() -> (ChatService, Arc<NotificationLog>) {
        let log = Arc::new(NotificationLog::new(10));
        let service = ChatService::new(ChatConfig::default(), log.clone());
        (service, log)
    }

    #[tokio::test(start_paused = true)]
    async fn test_trip_scenario() {
        let (service, _) = service();
        let sent = service.send_message("Plan my trip to Japan").await.unwrap();

        let conversation = service.conversation(sent.receipt.conversation_id).await.unwrap();
        assert_eq!(conversation.title, "Plan my trip to Japan");
        assert_eq!(conversation.messages.len(), 1);
        assert!(service.is_typing().await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        sent.reply.await.unwrap();

        let conversation = service.conversation(sent.receipt.conversation_id).await.unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[1].sender, Sender::Assistant);
        assert!(conversation.messages[1].text.contains("Plan my trip to Japan"));
        assert!(!service.is_typing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exactly_one_reply_per_send() {
        let (service, _) = service();
        let first = service.send_message("one").await.unwrap();
        let second = service.send_message("two").await.unwrap();

        first.reply.await.unwrap();
        second.reply.await.unwrap();
        assert!(!service.is_typing().await);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let conversation = service.conversation(first.receipt.conversation_id).await.unwrap();
        let senders: Vec<_> = conversation.messages.iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            [Sender::User, Sender::User, Sender::Assistant, Sender::Assistant]
        );
    }

    #[tokio::test]
    async fn test_blank_send_is_noop() {
        let (service, _) = service();
        assert!(service.send_message("   ").await.is_none());
        let snapshot = service.snapshot().await;
        assert!(snapshot.conversations.is_empty());
        assert!(!snapshot.is_typing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_delete_notifies_and_cancels_reply() {
        let (service, log) = service();
        let sent = service.send_message("Delete me").await.unwrap();
        let id = sent.receipt.conversation_id;

        let report = service
            .delete_conversation(id, &FixedDecision(Decision::Confirmed))
            .await;
        assert!(report.removed);
        assert_eq!(report.cancelled_replies, 1);

        assert_eq!(sent.reply.await.unwrap(), ReplyOutcome::Cancelled);
        let snapshot = service.snapshot().await;
        assert!(snapshot.conversations.is_empty());
        assert_eq!(snapshot.active_id, None);
        assert!(!snapshot.is_typing);

        let note = log.last().unwrap();
        assert_eq!(note.title, DELETED_NOTIFICATION_TITLE);
        assert_eq!(note.description, "\"Delete me\" has been deleted successfully.");
    }

    #[tokio::test]
    async fn test_cancelled_delete_keeps_store() {
        let (service, log) = service();
        let sent = service.send_message("Keep me").await.unwrap();
        let id = sent.receipt.conversation_id;

        let report = service
            .delete_conversation(id, &FixedDecision(Decision::Cancelled))
            .await;
        assert!(!report.removed);
        assert_eq!(service.filter_conversations("").await.len(), 1);
        assert_eq!(service.snapshot().await.active_id, Some(id));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_dialog_flow() {
        let (service, log) = service();
        let sent = service.send_message("Dialog").await.unwrap();
        let id = sent.receipt.conversation_id;

        assert_eq!(service.request_delete(id).await, "Dialog");
        assert_eq!(service.pending_delete(), Some(id));

        let report = service.cancel_delete().await.unwrap();
        assert_eq!(report.decision, Decision::Cancelled);
        assert_eq!(service.pending_delete(), None);
        assert!(service.confirm_delete().await.is_none());

        service.request_delete(id).await;
        let report = service.confirm_delete().await.unwrap();
        assert!(report.removed);
        assert!(service.filter_conversations("").await.iter().all(|c| c.id != id));
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_uses_fallback_title() {
        let (service, log) = service();
        let report = service
            .delete_conversation(ConversationId::new(), &FixedDecision(Decision::Confirmed))
            .await;
        assert!(!report.removed);
        assert_eq!(report.title, FALLBACK_TITLE);
        assert_eq!(
            log.last().unwrap().description,
            "\"Conversation\" has been deleted successfully."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_front_targeting_follows_position() {
        let config = ChatConfigBuilder::new()
            .reply_targeting(ReplyTargeting::FrontOfList)
            .build();
        let service = ChatService::new(config, Arc::new(NotificationLog::new(5)));

        let first = service.send_message("first").await.unwrap();
        service.select_conversation(None).await;
        let second = service.send_message("second").await.unwrap();

        let outcome = first.reply.await.unwrap();
        assert!(matches!(
            outcome,
            ReplyOutcome::Delivered { conversation_id, .. } if conversation_id == second.receipt.conversation_id
        ));
        second.reply.await.unwrap();

        let first_conv = service.conversation(first.receipt.conversation_id).await.unwrap();
        assert_eq!(first_conv.messages.len(), 1);
        let second_conv = service.conversation(second.receipt.conversation_id).await.unwrap();
        assert_eq!(second_conv.messages.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_id_targeting_follows_conversation() {
        let (service, _) = service();
        let first = service.send_message("first").await.unwrap();
        service.select_conversation(None).await;
        let second = service.send_message("second").await.unwrap();

        first.reply.await.unwrap();
        second.reply.await.unwrap();

        for id in [first.receipt.conversation_id, second.receipt.conversation_id] {
            let conv = service.conversation(id).await.unwrap();
            assert_eq!(conv.messages.len(), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending() {
        let (service, _) = service();
        let sent = service.send_message("later").await.unwrap();
        assert_eq!(service.shutdown().await, 1);
        assert_eq!(sent.reply.await.unwrap(), ReplyOutcome::Cancelled);
        assert!(!service.is_typing().await);
    }
}

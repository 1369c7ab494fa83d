//! Simulated assistant replies.
//!
//! Every send spawns one tokio task that waits for the reply delay and then
//! appends the canned assistant message. Each task is registered under the
//! conversation it was sent to, so deleting that conversation (or shutting
//! the service down) cancels it before it can touch the store.
//!
//! Registration and settlement both happen while holding the store write
//! lock, which keeps the typing counter and the registry in step.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::chat::core::ids::{ConversationId, MessageId};
use crate::chat::store::{ConversationStore, ReplyTarget, SendReceipt, SharedStore};
use crate::chat::types::{Message, simulated_reply};

/// How a scheduled reply ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplyOutcome {
    /// The assistant message was appended.
    Delivered {
        /// Conversation that received the reply.
        conversation_id: ConversationId,
        /// Id of the assistant message.
        message_id: MessageId,
    },
    /// The reply target no longer resolved when the delay elapsed.
    Orphaned,
    /// The reply was cancelled before it landed.
    Cancelled,
}

#[derive(Debug)]
struct PendingReply {
    ticket: u64,
    cancel: Arc<Notify>,
}

type Registry = DashMap<ConversationId, Vec<PendingReply>>;

/// Spawns and tracks pending simulated replies.
#[derive(Debug)]
pub struct ReplyScheduler {
    delay: Duration,
    pending: Arc<Registry>,
    next_ticket: AtomicU64,
}

impl ReplyScheduler {
    /// Create a scheduler with a fixed reply delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(DashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Schedule the reply for a recorded user message.
    ///
    /// `guard` must be the write guard of `store`; the reply is counted as
    /// pending before this returns.
    pub fn schedule(
        &self,
        store: &SharedStore,
        guard: &mut ConversationStore,
        receipt: &SendReceipt,
    ) -> JoinHandle<ReplyOutcome> {
        let owner = receipt.conversation_id;
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let cancel = Arc::new(Notify::new());

        guard.begin_reply();
        self.pending.entry(owner).or_default().push(PendingReply {
            ticket,
            cancel: Arc::clone(&cancel),
        });
        debug!(%owner, ticket, delay = ?self.delay, "Reply scheduled");

        let task = ReplyTask {
            store: Arc::clone(store),
            pending: Arc::clone(&self.pending),
            owner,
            ticket,
            target: receipt.reply_target,
            text: receipt.text.clone(),
        };
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => task.deliver().await,
                () = cancel.notified() => {
                    debug!(owner = %task.owner, ticket = task.ticket, "Reply cancelled");
                    ReplyOutcome::Cancelled
                }
            }
        })
    }

    /// Cancel every pending reply registered under `owner`.
    ///
    /// `guard` must be the write guard of the store the replies were
    /// scheduled against. Returns the number of cancelled replies.
    pub fn cancel_for(&self, guard: &mut ConversationStore, owner: ConversationId) -> usize {
        let Some((_, replies)) = self.pending.remove(&owner) else {
            return 0;
        };
        settle_cancelled(guard, &replies);
        replies.len()
    }

    /// Cancel every pending reply. Returns the number of cancelled replies.
    pub fn cancel_all(&self, guard: &mut ConversationStore) -> usize {
        let owners: Vec<ConversationId> = self.pending.iter().map(|e| *e.key()).collect();
        owners
            .into_iter()
            .map(|owner| self.cancel_for(guard, owner))
            .sum()
    }

    /// Number of replies still waiting for their delay.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.iter().map(|e| e.value().len()).sum()
    }
}

fn settle_cancelled(guard: &mut ConversationStore, replies: &[PendingReply]) {
    for reply in replies {
        guard.finish_reply();
        reply.cancel.notify_one();
    }
}

/// Everything a spawned reply needs once its delay has elapsed.
struct ReplyTask {
    store: SharedStore,
    pending: Arc<Registry>,
    owner: ConversationId,
    ticket: u64,
    target: ReplyTarget,
    text: String,
}

impl ReplyTask {
    async fn deliver(self) -> ReplyOutcome {
        let mut guard = self.store.write().await;

        // Cancelled between the timer firing and acquiring the lock.
        if !self.take_ticket() {
            debug!(owner = %self.owner, ticket = self.ticket, "Reply cancelled");
            return ReplyOutcome::Cancelled;
        }
        guard.finish_reply();

        let message = Message::assistant(simulated_reply(&self.text), Utc::now());
        let message_id = message.id;
        match guard.append_reply(self.target, message) {
            Some(conversation_id) => {
                debug!(%conversation_id, %message_id, "Reply delivered");
                ReplyOutcome::Delivered {
                    conversation_id,
                    message_id,
                }
            }
            None => {
                warn!(owner = %self.owner, reply_target = ?self.target, "Reply target no longer exists");
                ReplyOutcome::Orphaned
            }
        }
    }

    fn take_ticket(&self) -> bool {
        let mut found = false;
        let mut now_empty = false;
        if let Some(mut replies) = self.pending.get_mut(&self.owner) {
            let before = replies.len();
            replies.retain(|r| r.ticket != self.ticket);
            found = replies.len() != before;
            now_empty = replies.is_empty();
        }
        if now_empty {
            self.pending.remove_if(&self.owner, |_, replies| replies.is_empty());
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(
        store: &SharedStore,
        scheduler: &ReplyScheduler,
        text: &str,
    ) -> (SendReceipt, JoinHandle<ReplyOutcome>) {
        let mut guard = store.try_write().unwrap();
        let receipt = guard.send_message(text, Utc::now()).unwrap();
        let handle = scheduler.schedule(store, &mut guard, &receipt);
        (receipt, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_lands_after_delay() {
        let store = ConversationStore::default().into_shared();
        let scheduler = ReplyScheduler::new(Duration::from_secs(2));

        let (receipt, handle) = send(&store, &scheduler, "hello");
        assert!(store.read().await.is_typing());
        assert_eq!(scheduler.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(store.read().await.conversations()[0].messages.len(), 1);

        let outcome = handle.await.unwrap();
        assert!(matches!(
            outcome,
            ReplyOutcome::Delivered { conversation_id, .. } if conversation_id == receipt.conversation_id
        ));

        let guard = store.read().await;
        assert!(!guard.is_typing());
        let messages = &guard.conversations()[0].messages;
        assert_eq!(messages.len(), 2);
        assert!(messages[1].text.contains("\"hello\""));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_for_prevents_reply() {
        let store = ConversationStore::default().into_shared();
        let scheduler = ReplyScheduler::new(Duration::from_secs(2));

        let (receipt, handle) = send(&store, &scheduler, "bye");
        {
            let mut guard = store.write().await;
            assert_eq!(scheduler.cancel_for(&mut guard, receipt.conversation_id), 1);
            assert!(!guard.is_typing());
        }

        assert_eq!(handle.await.unwrap(), ReplyOutcome::Cancelled);
        assert_eq!(store.read().await.conversations()[0].messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_orphaned_reply() {
        let store = ConversationStore::default().into_shared();
        let scheduler = ReplyScheduler::new(Duration::from_millis(10));

        let (receipt, handle) = send(&store, &scheduler, "gone");
        store.write().await.delete_conversation(receipt.conversation_id);

        assert_eq!(handle.await.unwrap(), ReplyOutcome::Orphaned);
        assert!(!store.read().await.is_typing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let store = ConversationStore::default().into_shared();
        let scheduler = ReplyScheduler::new(Duration::from_secs(2));

        let (_, first) = send(&store, &scheduler, "one");
        let (_, second) = send(&store, &scheduler, "two");
        assert_eq!(store.read().await.pending_replies(), 2);

        let cancelled = scheduler.cancel_all(&mut *store.write().await);
        assert_eq!(cancelled, 2);
        assert_eq!(first.await.unwrap(), ReplyOutcome::Cancelled);
        assert_eq!(second.await.unwrap(), ReplyOutcome::Cancelled);
        assert!(!store.read().await.is_typing());
    }
}

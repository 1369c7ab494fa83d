//! Deletion confirmation: a two-outcome request/response exchange.
//!
//! Front-ends that can await an answer implement [`DeleteConfirmation`].
//! Front-ends where the answer arrives as a separate event (an HTTP call, the
//! next terminal line) park the request in a [`DeleteDialog`] and resolve it
//! later.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::chat::core::ids::ConversationId;

/// Answer to a confirmation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Proceed with the deletion.
    Confirmed,
    /// Leave the store untouched.
    Cancelled,
}

impl Decision {
    /// Map a yes/no answer.
    #[must_use]
    pub const fn from_bool(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Cancelled
        }
    }

    /// Whether the decision is `Confirmed`.
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Asks the user whether a conversation should really be deleted.
#[async_trait]
pub trait DeleteConfirmation: Send + Sync {
    /// Open the dialog for `conversation_id` (displayed as `title`).
    async fn open(&self, conversation_id: ConversationId, title: &str) -> Decision;
}

/// Always answers with the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub Decision);

#[async_trait]
impl DeleteConfirmation for FixedDecision {
    async fn open(&self, _conversation_id: ConversationId, _title: &str) -> Decision {
        self.0
    }
}

/// Single pending deletion request awaiting confirm or cancel.
#[derive(Debug, Default)]
pub struct DeleteDialog {
    pending: Mutex<Option<ConversationId>>,
}

impl DeleteDialog {
    /// Create a closed dialog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the dialog for `conversation_id`.
    ///
    /// Returns the request it replaced, if one was still open.
    pub fn open(&self, conversation_id: ConversationId) -> Option<ConversationId> {
        self.pending.lock().replace(conversation_id)
    }

    /// The conversation awaiting confirmation.
    #[must_use]
    pub fn pending(&self) -> Option<ConversationId> {
        *self.pending.lock()
    }

    /// Close the dialog with `decision`.
    ///
    /// Returns the request that was open, or `None` if the dialog was closed.
    pub fn resolve(&self, decision: Decision) -> Option<(ConversationId, Decision)> {
        self.pending.lock().take().map(|id| (id, decision))
    }
}

//! Notification sink for user-visible feedback.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

/// Receives human-readable notifications (toasts).
pub trait Notifier: Send + Sync {
    /// Surface a notification.
    fn notify(&self, title: &str, description: &str);
}

/// A notification as it was emitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Short headline.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Emission time.
    pub emitted_at: DateTime<Utc>,
}

/// Bounded in-memory log of notifications, oldest dropped first.
#[derive(Debug)]
pub struct NotificationLog {
    entries: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl NotificationLog {
    /// Create a log retaining at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Retained notifications, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Most recent notification.
    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().back().cloned()
    }

    /// Number of retained notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, title: &str, description: &str) {
        info!(%title, %description, "notification");
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(Notification {
            title: title.to_string(),
            description: description.to_string(),
            emitted_at: Utc::now(),
        });
    }
}

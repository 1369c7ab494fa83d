//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::chat::{ChatConfig, ChatResult, ChatService, NotificationLog, Notifier};

/// Shared application state.
pub struct AppState {
    /// Conversation engine.
    pub chat: ChatService,
    /// Notifications emitted by the engine, exposed to clients.
    pub notifications: Arc<NotificationLog>,
}

impl AppState {
    /// Create application state from the environment configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new() -> ChatResult<Arc<Self>> {
        Ok(Self::with_config(ChatConfig::from_env()?))
    }

    /// Create application state from an explicit configuration.
    #[must_use]
    pub fn with_config(config: ChatConfig) -> Arc<Self> {
        let notifications = Arc::new(NotificationLog::new(config.notification_capacity));
        let notifier: Arc<dyn Notifier> = notifications.clone();
        let chat = ChatService::new(config, notifier);
        Arc::new(Self {
            chat,
            notifications,
        })
    }
}

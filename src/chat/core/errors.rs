//! Error types for the chat subsystem.
//!
//! Store transitions are total and never fail; these errors only come from
//! the layers around the store (configuration, id parsing).

use thiserror::Error;

/// Chat subsystem error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A conversation or message id could not be parsed.
    #[error("invalid id: {0}")]
    InvalidId(#[from] uuid::Error),
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

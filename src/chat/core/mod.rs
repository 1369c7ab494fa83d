//! Core chat types: identifiers, configuration and errors.

pub mod config;
pub mod errors;
pub mod ids;

pub use config::{ChatConfig, ChatConfigBuilder, ReplyTargeting};
pub use errors::{ChatError, ChatResult};
pub use ids::{ConversationId, MessageId};

//! Configuration for the chat engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::core::errors::{ChatError, ChatResult};

/// Environment variable holding the simulated reply delay in milliseconds.
pub const ENV_REPLY_DELAY_MS: &str = "SUPERAI_REPLY_DELAY_MS";
/// Environment variable holding the maximum number of title characters.
pub const ENV_TITLE_MAX_CHARS: &str = "SUPERAI_TITLE_MAX_CHARS";
/// Environment variable selecting the reply targeting mode (`id` or `front`).
pub const ENV_REPLY_TARGETING: &str = "SUPERAI_REPLY_TARGETING";
/// Environment variable holding the notification log capacity.
pub const ENV_NOTIFICATION_CAPACITY: &str = "SUPERAI_NOTIFICATION_CAPACITY";

/// How the simulated reply finds the conversation it belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyTargeting {
    /// Resolve the conversation by id when the reply lands.
    #[default]
    ById,
    /// Replies to a freshly created conversation land in list position 0,
    /// whatever conversation sits there by then.
    FrontOfList,
}

impl ReplyTargeting {
    /// Parse the environment representation (`id` / `front`).
    ///
    /// # Errors
    /// Returns `ChatError::InvalidConfig` for any other value.
    pub fn parse(raw: &str) -> ChatResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "id" | "by_id" => Ok(Self::ById),
            "front" | "front_of_list" | "position" => Ok(Self::FrontOfList),
            other => Err(ChatError::InvalidConfig(format!(
                "unknown reply targeting mode: {other}"
            ))),
        }
    }
}

/// Top-level configuration for the chat engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Delay before the simulated assistant reply lands (milliseconds).
    pub reply_delay_ms: u64,
    /// Number of characters of the first message kept in the title.
    pub title_max_chars: usize,
    /// Reply targeting mode.
    pub reply_targeting: ReplyTargeting,
    /// Number of notifications retained by the notification log.
    pub notification_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 2000,
            title_max_chars: 30,
            reply_targeting: ReplyTargeting::ById,
            notification_capacity: 50,
        }
    }
}

impl ChatConfig {
    /// Reply delay as a `Duration`.
    #[must_use]
    pub const fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range.
    pub fn validate(&self) -> ChatResult<()> {
        if self.title_max_chars == 0 {
            return Err(ChatError::InvalidConfig(
                "title_max_chars must be > 0".to_string(),
            ));
        }

        if self.notification_capacity == 0 {
            return Err(ChatError::InvalidConfig(
                "notification_capacity must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed, or if the
    /// resulting configuration is invalid.
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset keys keep their default values.
    ///
    /// # Errors
    /// Returns an error if a value cannot be parsed, or if the resulting
    /// configuration is invalid.
    pub fn from_lookup<F>(lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ChatConfigBuilder::new();

        if let Some(raw) = lookup(ENV_REPLY_DELAY_MS) {
            builder = builder.reply_delay_ms(parse_number(ENV_REPLY_DELAY_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_TITLE_MAX_CHARS) {
            builder = builder.title_max_chars(parse_number(ENV_TITLE_MAX_CHARS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_REPLY_TARGETING) {
            builder = builder.reply_targeting(ReplyTargeting::parse(&raw)?);
        }
        if let Some(raw) = lookup(ENV_NOTIFICATION_CAPACITY) {
            builder =
                builder.notification_capacity(parse_number(ENV_NOTIFICATION_CAPACITY, &raw)?);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> ChatResult<T> {
    raw.trim().parse().map_err(|_| {
        ChatError::InvalidConfig(format!("{key} must be a non-negative integer, got {raw:?}"))
    })
}

/// Builder for chat configuration.
#[derive(Debug, Clone, Default)]
pub struct ChatConfigBuilder {
    reply_delay_ms: Option<u64>,
    title_max_chars: Option<usize>,
    reply_targeting: Option<ReplyTargeting>,
    notification_capacity: Option<usize>,
}

impl ChatConfigBuilder {
    /// Create a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reply delay in milliseconds.
    #[must_use]
    pub const fn reply_delay_ms(mut self, millis: u64) -> Self {
        self.reply_delay_ms = Some(millis);
        self
    }

    /// Set the title length limit.
    #[must_use]
    pub const fn title_max_chars(mut self, max: usize) -> Self {
        self.title_max_chars = Some(max);
        self
    }

    /// Set the reply targeting mode.
    #[must_use]
    pub const fn reply_targeting(mut self, targeting: ReplyTargeting) -> Self {
        self.reply_targeting = Some(targeting);
        self
    }

    /// Set the notification log capacity.
    #[must_use]
    pub const fn notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = Some(capacity);
        self
    }

    /// Build the chat configuration.
    #[must_use]
    pub fn build(self) -> ChatConfig {
        let default = ChatConfig::default();
        ChatConfig {
            reply_delay_ms: self.reply_delay_ms.unwrap_or(default.reply_delay_ms),
            title_max_chars: self.title_max_chars.unwrap_or(default.title_max_chars),
            reply_targeting: self.reply_targeting.unwrap_or(default.reply_targeting),
            notification_capacity: self
                .notification_capacity
                .unwrap_or(default.notification_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ChatConfig::default();
        assert_eq!(config.reply_delay_ms, 2000);
        assert_eq!(config.reply_delay(), Duration::from_secs(2));
        assert_eq!(config.title_max_chars, 30);
        assert_eq!(config.reply_targeting, ReplyTargeting::ById);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ChatConfigBuilder::new()
            .reply_delay_ms(10)
            .title_max_chars(12)
            .reply_targeting(ReplyTargeting::FrontOfList)
            .notification_capacity(3)
            .build();

        assert_eq!(config.reply_delay_ms, 10);
        assert_eq!(config.title_max_chars, 12);
        assert_eq!(config.reply_targeting, ReplyTargeting::FrontOfList);
        assert_eq!(config.notification_capacity, 3);
    }

    #[test]
    fn test_validate_rejects_zero_title() {
        let config = ChatConfigBuilder::new().title_max_chars(0).build();
        assert!(matches!(
            config.validate(),
            Err(ChatError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let config = ChatConfig::from_lookup(|key| match key {
            ENV_REPLY_DELAY_MS => Some("250".to_string()),
            ENV_REPLY_TARGETING => Some("front".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.reply_delay_ms, 250);
        assert_eq!(config.reply_targeting, ReplyTargeting::FrontOfList);
        assert_eq!(config.title_max_chars, 30);
    }

    #[test]
    fn test_from_lookup_rejects_bad_number() {
        let result = ChatConfig::from_lookup(|key| {
            (key == ENV_TITLE_MAX_CHARS).then(|| "thirty".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_targeting_parse() {
        assert_eq!(ReplyTargeting::parse(" ID ").unwrap(), ReplyTargeting::ById);
        assert!(ReplyTargeting::parse("sideways").is_err());
    }
}

//! Read-only projections used by front-ends.
//!
//! Sidebar summaries, message bubbles with avatar grouping, and the composer
//! key binding.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::core::ids::{ConversationId, MessageId};
use crate::chat::types::{Conversation, Message, Sender};

/// Day label shown next to a conversation in the sidebar.
#[must_use]
pub fn day_label(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let day = at.date_naive();
    let today = now.date_naive();
    if day == today {
        "Today".to_string()
    } else if Some(day) == today.checked_sub_signed(Duration::days(1)) {
        "Yesterday".to_string()
    } else {
        day.format("%m/%d/%Y").to_string()
    }
}

/// One sidebar row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    /// Conversation id.
    pub id: ConversationId,
    /// Title.
    pub title: String,
    /// Number of messages.
    pub message_count: usize,
    /// Last activity.
    pub updated_at: DateTime<Utc>,
    /// `Today`, `Yesterday` or a date.
    pub day_label: String,
    /// Whether this is the active conversation.
    pub is_active: bool,
}

impl ConversationSummary {
    /// Project a conversation for the sidebar.
    #[must_use]
    pub fn from_conversation(
        conversation: &Conversation,
        active: Option<ConversationId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: conversation.id,
            title: conversation.title.clone(),
            message_count: conversation.messages.len(),
            updated_at: conversation.updated_at,
            day_label: day_label(conversation.updated_at, now),
            is_active: active == Some(conversation.id),
        }
    }
}

/// Project a list of conversations for the sidebar.
#[must_use]
pub fn summarize<'a, I>(
    conversations: I,
    active: Option<ConversationId>,
    now: DateTime<Utc>,
) -> Vec<ConversationSummary>
where
    I: IntoIterator<Item = &'a Conversation>,
{
    conversations
        .into_iter()
        .map(|c| ConversationSummary::from_conversation(c, active, now))
        .collect()
}

/// One message bubble.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageView {
    /// Message id.
    pub id: MessageId,
    /// Body.
    pub text: String,
    /// Author.
    pub sender: Sender,
    /// `HH:MM` time label.
    pub time_label: String,
    /// First message of a run from the same sender.
    pub show_avatar: bool,
    /// Last message of a run from the same sender.
    pub last_in_group: bool,
}

/// Project messages into bubbles, grouping consecutive messages by sender.
#[must_use]
pub fn message_views(messages: &[Message]) -> Vec<MessageView> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            let show_avatar = index == 0 || messages[index - 1].sender != message.sender;
            let last_in_group = messages
                .get(index + 1)
                .is_none_or(|next| next.sender != message.sender);
            MessageView {
                id: message.id,
                text: message.text.clone(),
                sender: message.sender,
                time_label: message.timestamp.format("%H:%M").to_string(),
                show_avatar,
                last_in_group,
            }
        })
        .collect()
}

/// A key press in the composer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    /// Whether the key is Enter.
    pub enter: bool,
    /// Shift held.
    pub shift: bool,
    /// Ctrl held.
    pub ctrl: bool,
    /// Cmd / Meta held.
    pub meta: bool,
}

impl KeyPress {
    /// Plain Enter.
    #[must_use]
    pub const fn enter() -> Self {
        Self {
            enter: true,
            shift: false,
            ctrl: false,
            meta: false,
        }
    }

    /// Whether this key press submits the composer.
    ///
    /// Plain Enter and Ctrl/Cmd+Enter submit; Shift+Enter inserts a newline.
    #[must_use]
    pub const fn submits(self) -> bool {
        if !self.enter {
            return false;
        }
        let command = self.ctrl || self.meta;
        command || !self.shift
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 5, 0).unwrap()
    }

    #[test]
    fn test_day_labels() {
        let now = at(10, 12);
        assert_eq!(day_label(at(10, 1), now), "Today");
        assert_eq!(day_label(at(9, 23), now), "Yesterday");
        assert_eq!(day_label(at(2, 8), now), "03/02/2024");
    }

    #[test]
    fn test_message_grouping() {
        let messages = vec![
            Message::user("a", at(1, 9)),
            Message::user("b", at(1, 9)),
            Message::assistant("c", at(1, 10)),
        ];
        let views = message_views(&messages);

        let flags: Vec<_> = views.iter().map(|v| (v.show_avatar, v.last_in_group)).collect();
        assert_eq!(flags, [(true, false), (false, true), (true, true)]);
        assert_eq!(views[2].time_label, "10:05");
    }

    #[test]
    fn test_summary_marks_active() {
        let conversation = Conversation::start(Message::user("hi", at(10, 1)), 30);
        let rows = summarize([&conversation], Some(conversation.id), at(10, 12));
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_active);
        assert_eq!(rows[0].message_count, 1);
        assert_eq!(rows[0].day_label, "Today");

        let rows = summarize([&conversation], None, at(10, 12));
        assert!(!rows[0].is_active);
    }

    #[test]
    fn test_key_bindings() {
        assert!(KeyPress::enter().submits());
        assert!(!KeyPress { shift: true, ..KeyPress::enter() }.submits());
        assert!(KeyPress { ctrl: true, ..KeyPress::enter() }.submits());
        assert!(KeyPress { meta: true, shift: true, ..KeyPress::enter() }.submits());
        assert!(!KeyPress::default().submits());
    }
}

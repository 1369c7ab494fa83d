//! Line-oriented composer for terminal front-ends.
//!
//! A line ending with `\` is read as Shift+Enter and continues the draft.
//! Any other line is Enter and submits it.

use crate::chat::confirm::Decision;
use crate::chat::core::ids::ConversationId;
use crate::chat::view::KeyPress;

/// Draft text, the last listing shown and whether a y/N answer is awaited.
#[derive(Debug, Default)]
pub struct Composer {
    draft: String,
    listing: Vec<ConversationId>,
    confirming: bool,
}

impl Composer {
    /// Create an empty composer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw line. Returns the full message once the composer submits.
    pub fn feed(&mut self, line: &str) -> Option<String> {
        let (body, key) = line.strip_suffix('\\').map_or_else(
            || (line, KeyPress::enter()),
            |body| {
                (
                    body,
                    KeyPress {
                        shift: true,
                        ..KeyPress::enter()
                    },
                )
            },
        );
        self.draft.push_str(body);
        if key.submits() {
            Some(std::mem::take(&mut self.draft))
        } else {
            self.draft.push('\n');
            None
        }
    }

    /// Text typed so far and not yet submitted.
    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Whether `line` should be read as a command rather than message text.
    #[must_use]
    pub fn is_command(&self, line: &str) -> bool {
        self.draft.is_empty() && line.starts_with('/')
    }

    /// Remember the conversations in the order they were listed.
    pub fn set_listing(&mut self, ids: Vec<ConversationId>) {
        self.listing = ids;
    }

    /// Resolve a 1-based listing index.
    #[must_use]
    pub fn pick(&self, arg: &str) -> Option<ConversationId> {
        let index: usize = arg.trim().parse().ok()?;
        self.listing.get(index.checked_sub(1)?).copied()
    }

    /// Wait for a y/N answer on the next line.
    pub const fn ask_confirmation(&mut self) {
        self.confirming = true;
    }

    /// Whether the next line answers a confirmation prompt.
    #[must_use]
    pub const fn is_confirming(&self) -> bool {
        self.confirming
    }

    /// Read `line` as the y/N answer and close the prompt.
    ///
    /// Only `y` and `yes` (any case) confirm.
    pub fn answer(&mut self, line: &str) -> Decision {
        self.confirming = false;
        let answer = line.trim().to_ascii_lowercase();
        Decision::from_bool(answer == "y" || answer == "yes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_submits() {
        let mut composer = Composer::new();
        assert_eq!(composer.feed("hello").as_deref(), Some("hello"));
        assert!(composer.draft().is_empty());
    }

    #[test]
    fn test_trailing_backslash_continues() {
        let mut composer = Composer::new();
        assert!(composer.feed("a\\").is_none());
        assert_eq!(composer.draft(), "a\n");
        assert_eq!(composer.feed("b").as_deref(), Some("a\nb"));
        assert!(composer.draft().is_empty());
    }

    #[test]
    fn test_slash_inside_draft_is_text() {
        let mut composer = Composer::new();
        assert!(composer.is_command("/list"));

        composer.feed("first\\");
        assert!(!composer.is_command("/list"));
        assert_eq!(composer.feed("/list").as_deref(), Some("first\n/list"));
    }

    #[test]
    fn test_pick_is_one_based() {
        let mut composer = Composer::new();
        let first = ConversationId::new();
        let second = ConversationId::new();
        composer.set_listing(vec![first, second]);

        assert_eq!(composer.pick("1"), Some(first));
        assert_eq!(composer.pick(" 2 "), Some(second));
        assert_eq!(composer.pick("0"), None);
        assert_eq!(composer.pick("3"), None);
        assert_eq!(composer.pick("two"), None);
    }

    #[test]
    fn test_answer_routes_confirmation() {
        let mut composer = Composer::new();

        composer.ask_confirmation();
        assert!(composer.is_confirming());
        assert_eq!(composer.answer(" Yes "), Decision::Confirmed);
        assert!(!composer.is_confirming());

        composer.ask_confirmation();
        assert_eq!(composer.answer("y"), Decision::Confirmed);
        composer.ask_confirmation();
        assert_eq!(composer.answer(""), Decision::Cancelled);
        composer.ask_confirmation();
        assert_eq!(composer.answer("nope"), Decision::Cancelled);
    }
}

use crate::conversation::Message;
use std::collections::HashMap;

/// In-memory record of the conversation: the append-only message sequence
/// plus per-section expansion flags. The single source of truth rendered by
/// the view; has no network awareness.
#[derive(Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    expanded: HashMap<String, bool>,
    scroll_to_latest: bool,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the end of the sequence and raises the scroll-to-latest
    /// request for the next render pass. Messages are never mutated,
    /// removed, or reordered after this point.
    pub fn append(&mut self, message: Message) {
        debug_assert!(
            !self.messages.iter().any(|existing| existing.id == message.id),
            "duplicate message id {}",
            message.id
        );
        self.messages.push(message);
        self.scroll_to_latest = true;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Flips the expansion flag at `section_key`, creating it `true` when
    /// absent: the first toggle of any panel always expands it.
    pub fn toggle(&mut self, section_key: &str) {
        let entry = self.expanded.entry(section_key.to_string()).or_insert(false);
        *entry = !*entry;
    }

    /// Absent keys read as collapsed.
    pub fn is_expanded(&self, section_key: &str) -> bool {
        self.expanded.get(section_key).copied().unwrap_or(false)
    }

    /// Consumes the scroll request raised by the latest append. Scrolling is
    /// best-effort UI polish and must never block message processing.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_latest)
    }
}

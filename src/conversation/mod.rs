use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod store;

pub use store::ConversationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// Rendering mode tag; messages without one render as plain text.
// Only Pdf is produced by the current backend flow; the other kinds are
// part of the message contract and only drive rendering.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Code,
    Image,
    Pdf,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: u64,
    pub kind: Option<MessageKind>,
    pub metadata: Option<HashMap<String, Value>>,
}

impl Message {
    pub fn user(content: String) -> Self {
        Self::new(content, Sender::User)
    }

    pub fn assistant(content: String) -> Self {
        Self::new(content, Sender::Assistant)
    }

    fn new(content: String, sender: Sender) -> Self {
        Self {
            id: next_message_id(),
            content,
            sender,
            timestamp: now_millis(),
            kind: None,
            metadata: None,
        }
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Attaches metadata; an empty map is kept as `None` so the rendering
    /// layer can branch on presence alone.
    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = (!metadata.is_empty()).then_some(metadata);
        self
    }
}

fn now_millis() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis() as u64,
        Err(_) => 0,
    }
}

/// Ids must be unique and monotonically increasing in creation order.
/// Messages are appended and never reordered, so creation time plus a
/// process-wide sequence number is sufficient.
fn next_message_id() -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("msg-{}-{seq}", now_millis())
}

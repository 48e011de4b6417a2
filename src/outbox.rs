//! Optimistic send composition.
//!
//! The outbox mints local-pending messages stamped with this client's own
//! account id. The id scheme is `local-<unix millis>-<seq>`; the sequence
//! counter keeps rapid sends unique even within one millisecond.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::SendError;
use crate::model::{DeliveryStatus, Message, MessageId, Origin, LOCAL_ID_PREFIX};

pub struct Outbox {
    self_id: String,
    seq: AtomicU64,
}

impl Outbox {
    /// `self_id` is the fixed "own account" sender identity, injected once
    /// at startup from configuration.
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Build a local-pending message ready for `ConversationStore::append_local`.
    /// Blank text is rejected before anything touches the store or network.
    pub fn compose(&self, conversation_id: &str, text: &str) -> Result<Message, SendError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendError::EmptyMessage);
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        Ok(Message {
            id: MessageId(format!("{LOCAL_ID_PREFIX}{}-{seq}", now.as_millis())),
            conversation_id: conversation_id.to_string(),
            sender: self.self_id.clone(),
            text: text.to_string(),
            timestamp: now.as_secs() as i64,
            status: DeliveryStatus::Sent,
            origin: Origin::LocalPending,
        })
    }
}

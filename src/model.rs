//! Client-side view of conversations and messages.
//!
//! Backend-issued ids and locally minted ids share one identifier space;
//! local ids are tagged with the `local-` prefix so the two are always
//! distinguishable.

use std::fmt;

/// Prefix reserved for ids minted on this client before the backend has
/// confirmed the message.
pub const LOCAL_ID_PREFIX: &str = "local-";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        MessageId(s.to_string())
    }
}

/// Backend delivery state. Ordered so that merges can refuse to move a
/// confirmed message's status backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(DeliveryStatus::Sent),
            "delivered" => Some(DeliveryStatus::Delivered),
            "read" => Some(DeliveryStatus::Read),
            _ => None,
        }
    }
}

/// Where a message came from: a backend poll response, or an optimistic
/// local send that no poll has confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    LocalPending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: String,
    pub sender: String,
    pub text: String,
    /// Unix seconds; orders the conversation and drives the reconciliation
    /// window.
    pub timestamp: i64,
    pub status: DeliveryStatus,
    pub origin: Origin,
}

impl Message {
    pub fn is_pending(&self) -> bool {
        self.origin == Origin::LocalPending
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub contact_name: Option<String>,
    /// Ascending by timestamp; equal timestamps keep arrival order.
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, contact_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            contact_name,
            messages: Vec::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.contact_name.as_deref().unwrap_or(&self.id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

//! Wire shapes for the backend API.
//!
//! The backend groups messages by `wa_id` and stamps timestamps as
//! string-encoded unix seconds; everything here converts between that shape
//! and the domain types in [`crate::model`].

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Conversation, DeliveryStatus, Message, MessageId, Origin};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub message_id: String,
    pub from: String,
    /// Absent in grouped responses, where the conversation id is the map key.
    #[serde(default)]
    pub wa_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    /// String-encoded integer seconds since epoch.
    pub timestamp: String,
    pub text: String,
    pub status: String,
}

/// One value of the grouped conversation-list response.
#[derive(Debug, Clone, Deserialize)]
pub struct WireConversation {
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

impl WireMessage {
    /// Convert to the domain type, attributing the message to
    /// `conversation_id`. A timestamp that does not parse makes the message
    /// unorderable, so it is skipped with a warning rather than failing the
    /// whole poll; an unknown status string degrades to `sent`.
    pub fn into_message(self, conversation_id: &str) -> Option<Message> {
        let timestamp = match self.timestamp.trim().parse::<i64>() {
            Ok(ts) => ts,
            Err(_) => {
                warn!(
                    "skipping message {} with unparseable timestamp {:?}",
                    self.message_id, self.timestamp
                );
                return None;
            }
        };
        let status = DeliveryStatus::parse(&self.status).unwrap_or(DeliveryStatus::Sent);
        Some(Message {
            id: MessageId(self.message_id),
            conversation_id: conversation_id.to_string(),
            sender: self.from,
            text: self.text,
            timestamp,
            status,
            origin: Origin::Confirmed,
        })
    }

    /// The POST body for a send; mirrors what the original client submits.
    pub fn from_message(msg: &Message, contact_name: Option<&str>) -> Self {
        Self {
            message_id: msg.id.to_string(),
            from: msg.sender.clone(),
            wa_id: msg.conversation_id.clone(),
            contact_name: contact_name.map(String::from),
            timestamp: msg.timestamp.to_string(),
            text: msg.text.clone(),
            status: msg.status.as_str().to_string(),
        }
    }
}

/// Parse the grouped list response (`wa_id -> {contact_name, messages}`).
/// Key order is preserved; it is the poll-response order that default
/// selection relies on. Entries that fail to parse are skipped.
pub fn conversations_from_grouped(grouped: serde_json::Map<String, Value>) -> Vec<Conversation> {
    grouped
        .into_iter()
        .filter_map(|(wa_id, value)| {
            let wire: WireConversation = match serde_json::from_value(value) {
                Ok(wire) => wire,
                Err(err) => {
                    warn!("skipping malformed conversation {wa_id}: {err}");
                    return None;
                }
            };
            let messages = wire
                .messages
                .into_iter()
                .filter_map(|m| m.into_message(&wa_id))
                .collect();
            Some(Conversation {
                id: wa_id,
                contact_name: wire.contact_name.filter(|n| !n.is_empty()),
                messages,
            })
        })
        .collect()
}

/// Parse the detail response (`/messages/{wa_id}`), a flat message array.
pub fn messages_from_detail(conversation_id: &str, items: Vec<WireMessage>) -> Vec<Message> {
    items
        .into_iter()
        .filter_map(|m| m.into_message(conversation_id))
        .collect()
}

//! In-memory conversation state.
//!
//! The store is the single owner of all conversation and message data on the
//! client. Poll results land here through [`ConversationStore::replace_all`]
//! and [`ConversationStore::replace_messages`]; optimistic sends land here
//! through [`ConversationStore::append_local`]. Everything else reads
//! snapshots.
//!
//! Merge contract: incoming confirmed messages are authoritative and replace
//! the confirmed set wholesale; local-pending messages survive a merge until
//! a confirmed message reconciles them (same logical send) or their id shows
//! up in a poll response.

use std::collections::HashSet;

use crate::error::StoreError;
use crate::model::{Conversation, Message, MessageId};

/// Clock-skew tolerance when matching a local-pending message against a
/// confirmed one. Client and backend both stamp unix seconds, so the window
/// only has to absorb drift, not timezone-sized gaps.
pub const RECONCILE_WINDOW_SECS: i64 = 120;

/// True when `confirmed` plausibly is the backend's copy of the optimistic
/// `pending` send: same conversation, same sender, same trimmed text, stamped
/// within the skew window.
fn reconciles(pending: &Message, confirmed: &Message) -> bool {
    pending.conversation_id == confirmed.conversation_id
        && pending.sender == confirmed.sender
        && pending.text.trim() == confirmed.text.trim()
        && (pending.timestamp - confirmed.timestamp).abs() <= RECONCILE_WINDOW_SECS
}

#[derive(Debug, Default)]
pub struct ConversationStore {
    // Poll-response order; default selection depends on it.
    conversations: Vec<Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wholesale replace from a conversation-list poll. Conversation metadata
    /// and confirmed messages come entirely from `incoming`; local-pending
    /// messages held for a surviving conversation are carried over unless the
    /// incoming set reconciles them.
    pub fn replace_all(&mut self, incoming: Vec<Conversation>) {
        let old = std::mem::take(&mut self.conversations);
        self.conversations = incoming
            .into_iter()
            .map(|conv| {
                let prior = old.iter().find(|c| c.id == conv.id);
                Conversation {
                    messages: merge_confirmed(prior, conv.messages),
                    ..conv
                }
            })
            .collect();
    }

    /// Same merge rule, applied to a single conversation's detail poll.
    /// Unknown conversation ids are dropped on the floor: only the list poll
    /// creates conversations, and a stale detail response racing a removal
    /// must not resurrect one.
    pub fn replace_messages(&mut self, conversation_id: &str, incoming: Vec<Message>) {
        let Some(idx) = self.conversations.iter().position(|c| c.id == conversation_id) else {
            log::debug!("dropping detail poll for unknown conversation {conversation_id}");
            return;
        };
        let prior = &self.conversations[idx];
        let merged = merge_confirmed(Some(prior), incoming);
        self.conversations[idx].messages = merged;
    }

    /// Insert an optimistic local-pending message at its sorted position.
    pub fn append_local(&mut self, message: Message) -> Result<(), StoreError> {
        if message.text.trim().is_empty()
            || message.conversation_id.is_empty()
            || message.sender.is_empty()
        {
            return Err(StoreError::InvalidMessage);
        }
        let conv = self
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
            .ok_or_else(|| StoreError::UnknownConversation(message.conversation_id.clone()))?;
        if conv.messages.iter().any(|m| m.id == message.id) {
            return Err(StoreError::DuplicateId(message.id.to_string()));
        }
        insert_sorted(&mut conv.messages, message);
        Ok(())
    }

    /// Drop a local-pending message that a later confirmed message has
    /// superseded. Merges do this internally; the operation is public so a
    /// caller that learns the server id out of band can collapse the pair
    /// itself. Returns whether anything was removed.
    pub fn reconcile(&mut self, conversation_id: &str, local_id: &MessageId) -> bool {
        let Some(conv) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        else {
            return false;
        };
        let before = conv.messages.len();
        conv.messages
            .retain(|m| !(m.is_pending() && m.id == *local_id));
        conv.messages.len() != before
    }

    pub fn get(&self, conversation_id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == conversation_id)
    }

    pub fn get_all(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation_ids(&self) -> Vec<String> {
        self.conversations.iter().map(|c| c.id.clone()).collect()
    }
}

/// Merge an incoming confirmed message list with whatever we previously held
/// for the conversation.
///
/// Incoming messages are deduplicated by id and stable-sorted ascending by
/// timestamp; they form the base. Prior local-pending messages are then
/// re-inserted unless reconciled. Each incoming message may reconcile at most
/// one pending message, so two rapid identical-text sends are only collapsed
/// once two distinct confirmed copies have arrived.
fn merge_confirmed(prior: Option<&Conversation>, incoming: Vec<Message>) -> Vec<Message> {
    let mut seen: HashSet<MessageId> = HashSet::new();
    let mut base: Vec<Message> = Vec::new();
    for mut msg in incoming {
        if !seen.insert(msg.id.clone()) {
            continue;
        }
        // Status never regresses for an id we already hold confirmed.
        if let Some(held) = prior.and_then(|c| {
            c.messages
                .iter()
                .find(|m| m.id == msg.id && !m.is_pending())
        }) {
            if held.status > msg.status {
                msg.status = held.status;
            }
        }
        base.push(msg);
    }
    base.sort_by_key(|m| m.timestamp);

    let Some(prior) = prior else { return base };
    let mut matched: HashSet<MessageId> = HashSet::new();
    for pending in prior.messages.iter().filter(|m| m.is_pending()) {
        if seen.contains(&pending.id) {
            continue; // id made it into a poll response somehow
        }
        let twin = base
            .iter()
            .find(|c| !matched.contains(&c.id) && reconciles(pending, c));
        match twin {
            Some(confirmed) => {
                matched.insert(confirmed.id.clone());
            }
            None => insert_sorted(&mut base, pending.clone()),
        }
    }
    base
}

/// Insert keeping ascending timestamp order; equal timestamps go after the
/// existing run, preserving arrival order.
fn insert_sorted(messages: &mut Vec<Message>, message: Message) {
    let pos = messages.partition_point(|m| m.timestamp <= message.timestamp);
    messages.insert(pos, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeliveryStatus, Origin};

    fn confirmed(id: &str, conv: &str, sender: &str, text: &str, ts: i64) -> Message {
        Message {
            id: MessageId::from(id),
            conversation_id: conv.to_string(),
            sender: sender.to_string(),
            text: text.to_string(),
            timestamp: ts,
            status: DeliveryStatus::Sent,
            origin: Origin::Confirmed,
        }
    }

    fn pending(id: &str, conv: &str, sender: &str, text: &str, ts: i64) -> Message {
        Message {
            origin: Origin::LocalPending,
            ..confirmed(id, conv, sender, text, ts)
        }
    }

    fn conv(id: &str, name: Option<&str>, messages: Vec<Message>) -> Conversation {
        Conversation {
            id: id.to_string(),
            contact_name: name.map(String::from),
            messages,
        }
    }

    #[test]
    fn replace_all_is_idempotent() {
        let payload = || {
            vec![conv(
                "123",
                Some("Alice"),
                vec![
                    confirmed("m2", "123", "123", "second", 200),
                    confirmed("m1", "123", "123", "first", 100),
                ],
            )]
        };
        let mut store = ConversationStore::new();
        store.replace_all(payload());
        let first: Vec<Conversation> = store.get_all().to_vec();
        store.replace_all(payload());
        assert_eq!(store.get_all(), &first[..]);
    }

    #[test]
    fn merge_sorts_ascending_and_dedupes_ids() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv(
            "123",
            None,
            vec![
                confirmed("m3", "123", "123", "three", 300),
                confirmed("m1", "123", "123", "one", 100),
                confirmed("m1", "123", "123", "one again", 100),
                confirmed("m2", "123", "123", "two", 200),
            ],
        )]);
        let msgs = &store.get("123").unwrap().messages;
        let ids: Vec<&str> = msgs.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
        assert!(msgs.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("123", None, vec![])]);
        store.replace_messages(
            "123",
            vec![
                confirmed("a", "123", "123", "a", 100),
                confirmed("b", "123", "123", "b", 100),
            ],
        );
        store
            .append_local(pending("local-1", "123", "me", "c", 100))
            .unwrap();
        let ids: Vec<&str> = store.get("123").unwrap().messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "local-1"]);
    }

    #[test]
    fn append_local_rejects_blank_text_and_unknown_conversation() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("123", None, vec![])]);
        assert_eq!(
            store.append_local(pending("local-1", "123", "me", "   ", 100)),
            Err(StoreError::InvalidMessage)
        );
        assert!(matches!(
            store.append_local(pending("local-1", "999", "me", "hi", 100)),
            Err(StoreError::UnknownConversation(_))
        ));
        assert_eq!(
            store.append_local(pending("local-1", "", "me", "hi", 100)),
            Err(StoreError::InvalidMessage)
        );
    }

    #[test]
    fn append_local_rejects_duplicate_id() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("123", None, vec![])]);
        store
            .append_local(pending("local-1", "123", "me", "hi", 100))
            .unwrap();
        assert_eq!(
            store.append_local(pending("local-1", "123", "me", "hi again", 101)),
            Err(StoreError::DuplicateId("local-1".into()))
        );
    }

    #[test]
    fn merge_keeps_unreconciled_pending_messages() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv(
            "123",
            None,
            vec![confirmed("m1", "123", "123", "hi", 100)],
        )]);
        store
            .append_local(pending("local-1", "123", "me", "yo", 150))
            .unwrap();
        // Next poll does not know about the send yet.
        store.replace_all(vec![conv(
            "123",
            None,
            vec![confirmed("m1", "123", "123", "hi", 100)],
        )]);
        let msgs = &store.get("123").unwrap().messages;
        assert_eq!(msgs.len(), 2);
        assert!(msgs[1].is_pending());
        assert_eq!(msgs[1].text, "yo");
    }

    #[test]
    fn merge_reconciles_pending_with_confirmed_twin() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv(
            "123",
            None,
            vec![confirmed("m1", "123", "123", "hi", 100)],
        )]);
        store
            .append_local(pending("local-1", "123", "me", "yo", 150))
            .unwrap();
        // Backend persisted the send; its copy is a few seconds skewed.
        store.replace_messages(
            "123",
            vec![
                confirmed("m1", "123", "123", "hi", 100),
                confirmed("m2", "123", "me", "yo", 153),
            ],
        );
        let msgs = &store.get("123").unwrap().messages;
        let ids: Vec<&str> = msgs.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);
        assert!(msgs.iter().all(|m| !m.is_pending()));
    }

    #[test]
    fn one_confirmed_message_reconciles_at_most_one_pending() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("123", None, vec![])]);
        store
            .append_local(pending("local-1", "123", "me", "ok", 100))
            .unwrap();
        store
            .append_local(pending("local-2", "123", "me", "ok", 101))
            .unwrap();
        store.replace_messages("123", vec![confirmed("m1", "123", "me", "ok", 100)]);
        let msgs = &store.get("123").unwrap().messages;
        // One send confirmed, the other still pending; nothing lost.
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs.iter().filter(|m| m.is_pending()).count(), 1);
    }

    #[test]
    fn pending_outside_skew_window_is_not_matched() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("123", None, vec![])]);
        store
            .append_local(pending("local-1", "123", "me", "yo", 100))
            .unwrap();
        store.replace_messages(
            "123",
            vec![confirmed("m1", "123", "me", "yo", 100 + RECONCILE_WINDOW_SECS + 1)],
        );
        let msgs = &store.get("123").unwrap().messages;
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs.iter().filter(|m| m.is_pending()).count(), 1);
    }

    #[test]
    fn status_never_regresses_for_known_ids() {
        let mut store = ConversationStore::new();
        let mut read = confirmed("m1", "123", "me", "hi", 100);
        read.status = DeliveryStatus::Read;
        store.replace_all(vec![conv("123", None, vec![read])]);
        // A lagging poll still carries "sent".
        store.replace_messages("123", vec![confirmed("m1", "123", "me", "hi", 100)]);
        assert_eq!(
            store.get("123").unwrap().messages[0].status,
            DeliveryStatus::Read
        );
    }

    #[test]
    fn replace_messages_for_unknown_conversation_is_a_noop() {
        let mut store = ConversationStore::new();
        store.replace_messages("nope", vec![confirmed("m1", "nope", "x", "hi", 1)]);
        assert!(store.get("nope").is_none());
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn explicit_reconcile_removes_only_the_pending_copy() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv(
            "123",
            None,
            vec![confirmed("m1", "123", "123", "hi", 100)],
        )]);
        store
            .append_local(pending("local-1", "123", "me", "yo", 150))
            .unwrap();
        assert!(store.reconcile("123", &MessageId::from("local-1")));
        assert!(!store.reconcile("123", &MessageId::from("local-1")));
        assert!(!store.reconcile("123", &MessageId::from("m1")));
        assert_eq!(store.get("123").unwrap().messages.len(), 1);
    }

    #[test]
    fn replace_all_preserves_poll_response_order() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("b", None, vec![]), conv("a", None, vec![])]);
        assert_eq!(store.conversation_ids(), ["b", "a"]);
    }
}

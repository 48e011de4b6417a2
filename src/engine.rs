//! Wires the store, backend, pollers, outbox, and selection together.
//!
//! Two pollers run: one for the grouped conversation list (engine lifetime)
//! and one for the selected conversation's detail (restarted whenever the
//! selection changes; the old poller is fully stopped before the new one
//! starts, so a stale poll can never write into the wrong conversation).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::error;

use crate::api::models::WireMessage;
use crate::api::{ApiClient, Backend};
use crate::config::Config;
use crate::error::{ApiError, SendError};
use crate::model::{Conversation, MessageId};
use crate::outbox::Outbox;
use crate::poller::Poller;
use crate::selection::Selection;
use crate::store::ConversationStore;

/// The store is the one shared mutable resource; every mutation happens
/// under this lock, atomically with respect to reads.
pub type SharedStore = Arc<Mutex<ConversationStore>>;

// Poisoning only happens if a panic escaped a merge; the state itself is
// still consistent, so recover rather than cascade.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Active {
    selection: Selection,
    detail: Option<Poller>,
}

pub struct Engine<B: Backend> {
    backend: Arc<B>,
    store: SharedStore,
    outbox: Outbox,
    active: Arc<Mutex<Active>>,
    list_poller: Option<Poller>,
    list_interval: Duration,
    detail_interval: Duration,
}

impl Engine<ApiClient> {
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Ok(Self::new(ApiClient::new(&config.base_url)?, config))
    }
}

impl<B: Backend> Engine<B> {
    pub fn new(backend: B, config: &Config) -> Self {
        Self {
            backend: Arc::new(backend),
            store: Arc::new(Mutex::new(ConversationStore::new())),
            outbox: Outbox::new(config.self_id.clone()),
            active: Arc::new(Mutex::new(Active {
                selection: Selection::new(),
                detail: None,
            })),
            list_poller: None,
            list_interval: Duration::from_millis(config.list_poll_interval_ms),
            detail_interval: Duration::from_millis(config.detail_poll_interval_ms),
        }
    }

    /// Begin polling the conversation list. The first successful poll also
    /// applies the default-selection policy and starts the detail poller for
    /// whichever conversation it picked.
    pub fn start(&mut self) {
        if self.list_poller.is_some() {
            return;
        }
        let backend = self.backend.clone();
        let store = self.store.clone();
        let active = self.active.clone();
        let detail_interval = self.detail_interval;
        let fetch = move || {
            let backend = backend.clone();
            let store = store.clone();
            let active = active.clone();
            async move {
                let conversations = backend.list_conversations().await?;
                let ids: Vec<String> = conversations.iter().map(|c| c.id.clone()).collect();
                lock(&store).replace_all(conversations);
                let mut active = lock(&active);
                if active.selection.on_conversations_loaded(&ids) {
                    if let Some(id) = active.selection.selected().map(String::from) {
                        active.detail =
                            Some(detail_poller(backend, store, id, detail_interval));
                    }
                }
                Ok(())
            }
        };
        self.list_poller = Some(Poller::start(fetch, self.list_interval));
    }

    /// Explicit user selection. Stops the previous conversation's detail
    /// poller completely before starting one for the new conversation.
    pub async fn select(&self, conversation_id: &str) {
        let previous = {
            let mut active = lock(&self.active);
            if !active.selection.select(conversation_id) {
                return;
            }
            active.detail.take()
        };
        if let Some(poller) = previous {
            poller.stop().await;
        }
        let poller = detail_poller(
            self.backend.clone(),
            self.store.clone(),
            conversation_id.to_string(),
            self.detail_interval,
        );
        lock(&self.active).detail = Some(poller);
    }

    pub fn selected(&self) -> Option<String> {
        lock(&self.active).selection.selected().map(String::from)
    }

    /// Send into the currently selected conversation.
    pub fn send(&self, text: &str) -> Result<MessageId, SendError> {
        let conversation_id = self.selected().ok_or(SendError::NoSelection)?;
        self.send_to(&conversation_id, text)
    }

    /// Optimistic send: the message is visible in the store before the
    /// submit round trip even starts. A failed submit is logged and the
    /// local-pending message stays visible; the next poll reconciles
    /// successful sends.
    pub fn send_to(&self, conversation_id: &str, text: &str) -> Result<MessageId, SendError> {
        let message = self.outbox.compose(conversation_id, text)?;
        let contact_name = {
            let mut store = lock(&self.store);
            store.append_local(message.clone())?;
            store
                .get(conversation_id)
                .and_then(|c| c.contact_name.clone())
        };
        let payload = WireMessage::from_message(&message, contact_name.as_deref());
        let backend = self.backend.clone();
        let local_id = message.id.clone();
        tokio::spawn(async move {
            if let Err(err) = backend.submit_message(payload).await {
                error!("submit of {local_id} failed, message stays unconfirmed: {err}");
            }
        });
        Ok(message.id)
    }

    /// Shared handle for read access; presentation should treat the contents
    /// as transient snapshots.
    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn snapshot(&self) -> Vec<Conversation> {
        lock(&self.store).get_all().to_vec()
    }

    /// Stop all pollers. No store writes happen after this returns.
    pub async fn shutdown(&mut self) {
        if let Some(poller) = self.list_poller.take() {
            poller.stop().await;
        }
        let detail = lock(&self.active).detail.take();
        if let Some(poller) = detail {
            poller.stop().await;
        }
    }
}

fn detail_poller<B: Backend>(
    backend: Arc<B>,
    store: SharedStore,
    conversation_id: String,
    every: Duration,
) -> Poller {
    Poller::start(
        move || {
            let backend = backend.clone();
            let store = store.clone();
            let id = conversation_id.clone();
            async move {
                let messages = backend.list_messages(&id).await?;
                lock(&store).replace_messages(&id, messages);
                Ok(())
            }
        },
        every,
    )
}

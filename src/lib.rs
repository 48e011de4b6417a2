//! Client core for a WhatsApp Web clone.
//!
//! Keeps an in-memory view of chat conversations approximately in sync with
//! the backend by polling, lets the user send messages that show up
//! immediately as local-pending, and reconciles those optimistic sends
//! against later poll responses without duplicates.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod outbox;
pub mod poller;
pub mod selection;
pub mod store;

pub use config::Config;
pub use engine::Engine;
pub use error::{ApiError, SendError, StoreError};
pub use model::{Conversation, DeliveryStatus, Message, MessageId, Origin};
pub use store::ConversationStore;

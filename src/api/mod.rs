pub mod client;
pub mod models;

use std::future::Future;

use crate::error::ApiError;
use crate::model::{Conversation, Message};
use models::WireMessage;

pub use client::ApiClient;

/// The backend collaborator, as consumed by the sync engine. [`ApiClient`]
/// is the HTTP implementation; tests script their own.
pub trait Backend: Send + Sync + 'static {
    fn list_conversations(
        &self,
    ) -> impl Future<Output = Result<Vec<Conversation>, ApiError>> + Send;

    fn list_messages(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Vec<Message>, ApiError>> + Send;

    fn submit_message(
        &self,
        payload: WireMessage,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl Backend for ApiClient {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        ApiClient::list_conversations(self).await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        ApiClient::list_messages(self, conversation_id).await
    }

    async fn submit_message(&self, payload: WireMessage) -> Result<(), ApiError> {
        ApiClient::submit_message(self, payload).await
    }
}

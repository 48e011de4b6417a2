use reqwest::Client as HttpClient;
use serde_json::Value;
use url::Url;

use crate::api::models::{self, WireMessage};
use crate::error::ApiError;
use crate::model::{Conversation, Message};

/// Thin typed wrapper over the backend's three operations.
pub struct ApiClient {
    http: HttpClient,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut normalized = normalize_url(base_url);
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        Ok(Self {
            http: HttpClient::new(),
            base: Url::parse(&normalized)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    /// `GET /messages` — the full grouped conversation list.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let resp = self.http.get(self.endpoint("messages")?).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        let grouped: serde_json::Map<String, Value> = resp.json().await?;
        Ok(models::conversations_from_grouped(grouped))
    }

    /// `GET /messages/{wa_id}` — one conversation's messages.
    pub async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        let resp = self
            .http
            .get(self.endpoint(&format!("messages/{conversation_id}"))?)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        let items: Vec<WireMessage> = resp.json().await?;
        Ok(models::messages_from_detail(conversation_id, items))
    }

    /// `POST /messages` — persist a send. The ack body carries only the
    /// inserted document id, which this client does not use; reconciliation
    /// happens on the next poll instead.
    pub async fn submit_message(&self, payload: WireMessage) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.endpoint("messages")?)
            .json(&payload)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        Ok(())
    }
}

fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

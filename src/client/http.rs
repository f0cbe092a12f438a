//! HTTP implementation of the assistant client

use super::types::{ChatReply, ChatRequest};
use super::{AssistantClient, AssistantError};
use crate::config::ChatConfig;
use async_trait::async_trait;
use reqwest::Client;

/// Talks to the assistant over `POST {backend}/api/chat`
pub struct HttpAssistantClient {
    client: Client,
    endpoint: String,
}

impl HttpAssistantClient {
    pub fn new(config: &ChatConfig) -> Result<Self, AssistantError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AssistantError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.chat_endpoint(),
        })
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> AssistantError {
        // Keep diagnostics short; FastAPI error bodies can echo the prompt
        let detail: String = body.chars().take(200).collect();
        AssistantError::backend(format!("Assistant returned {status}: {detail}"))
    }
}

#[async_trait]
impl AssistantClient for HttpAssistantClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| AssistantError::transport(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AssistantError::transport(format!("Failed to read response: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| AssistantError::backend(format!("Malformed assistant response: {e}")))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

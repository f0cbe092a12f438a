//! Menu assistant client
//!
//! The assistant is reachable through a single request/response call.
//! [`AssistantClient`] is the seam the dispatcher depends on; the HTTP
//! implementation and the logging wrapper live behind it.

mod error;
mod http;
mod types;

pub use error::{AssistantError, AssistantErrorKind};
pub use http::HttpAssistantClient;
pub use types::{ChatReply, ChatRequest};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Client for the remote menu assistant
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Send one user message and wait for the assistant's reply
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError>;

    /// Where requests go, for diagnostics
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: AssistantClient + ?Sized> AssistantClient for Arc<T> {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        (**self).chat(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for assistant clients
pub struct LoggingClient {
    inner: Arc<dyn AssistantClient>,
    endpoint: String,
}

impl LoggingClient {
    pub fn new(inner: Arc<dyn AssistantClient>) -> Self {
        let endpoint = inner.endpoint().to_string();
        Self { inner, endpoint }
    }
}

#[async_trait]
impl AssistantClient for LoggingClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        let start = Instant::now();
        let result = self.inner.chat(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    session_id = %reply.session_id,
                    "Assistant request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    kind = %e.kind,
                    error = %e.message,
                    "Assistant request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

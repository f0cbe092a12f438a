//! Effects produced by state transitions

use crate::client::ChatRequest;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the single outbound call for an accepted turn
    RequestAssistant { request: ChatRequest },

    /// The assistant's session token was stored for the first time
    SessionCommitted { session_id: String },

    /// A reply carried a token other than the committed one; it was dropped
    SessionMismatch { kept: String, ignored: String },
}

impl Effect {
    pub fn request_assistant(session_id: Option<&str>, message: impl Into<String>) -> Self {
        Effect::RequestAssistant {
            request: ChatRequest {
                session_id: session_id.map(str::to_string),
                message: message.into(),
            },
        }
    }
}

//! Events that can occur in a conversation

use crate::client::AssistantErrorKind;
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Typed input or a quick action was submitted
    UserSubmit { text: String, at: DateTime<Utc> },

    /// The assistant answered the in-flight request
    ReplyReceived {
        content: String,
        timestamp: DateTime<Utc>,
        session_id: String,
    },

    /// The in-flight request failed. The kind is kept for diagnostics only.
    RequestFailed {
        kind: AssistantErrorKind,
        at: DateTime<Utc>,
    },
}

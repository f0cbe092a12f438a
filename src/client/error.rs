//! Assistant client error types

use std::fmt;
use thiserror::Error;

/// Failure talking to the assistant, with classification
#[derive(Debug, Clone, Error)]
#[error("{kind} failure: {message}")]
pub struct AssistantError {
    pub kind: AssistantErrorKind,
    pub message: String,
}

impl AssistantError {
    pub fn new(kind: AssistantErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Transport, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Backend, message)
    }
}

/// Error classification. Both kinds end the turn the same way; the kind
/// only feeds diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantErrorKind {
    /// Could not reach or finish talking to the service (connect, timeout, reset)
    Transport,
    /// Service answered with a non-success status or an unreadable payload
    Backend,
}

impl AssistantErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Backend => "backend",
        }
    }
}

impl fmt::Display for AssistantErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

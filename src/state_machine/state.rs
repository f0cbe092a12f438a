//! Conversation state types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Greeting shown as the first assistant turn of every conversation
pub const GREETING: &str = "Hello! Welcome to Curry Pizza House! 🍕\n\n\
I'm your AI menu assistant. I can help you with:\n\
• Pizza menu & toppings\n\
• Vegetarian options\n\
• Allergen information\n\
• Wings & appetizers\n\n\
What would you like to know?";

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One message of the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

// ============================================================================
// Message Log
// ============================================================================

/// Append-only conversation record.
///
/// Insertion order is display order. Turns are never re-sorted by their
/// timestamps, so clock skew between client and assistant cannot reorder
/// the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageLog {
    turns: Vec<Turn>,
}

impl MessageLog {
    /// A log holding only the greeting turn
    pub fn seeded(at: DateTime<Utc>) -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING, at)],
        }
    }

    /// Add a turn at the end and return the new length
    pub fn append(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

// ============================================================================
// Session Store
// ============================================================================

/// Correlation token issued by the assistant. Set at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionStore {
    token: Option<String>,
}

impl SessionStore {
    /// The token to send with the next request, if one has been issued
    pub fn current(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Store `token` unless a token is already held. Returns true if the
    /// store changed. Empty tokens are never committed.
    pub fn commit_if_absent(&mut self, token: &str) -> bool {
        if self.token.is_some() || token.is_empty() {
            return false;
        }
        self.token = Some(token.to_string());
        true
    }

    pub fn is_committed(&self) -> bool {
        self.token.is_some()
    }
}

// ============================================================================
// Chat State
// ============================================================================

/// Full state of one conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatState {
    pub(crate) log: MessageLog,
    pub(crate) session: SessionStore,
    /// True strictly between issuing a request and its settlement
    pub(crate) pending: bool,
}

impl ChatState {
    /// Fresh conversation: greeting turn, no session, nothing in flight
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            log: MessageLog::seeded(created_at),
            session: SessionStore::default(),
            pending: false,
        }
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

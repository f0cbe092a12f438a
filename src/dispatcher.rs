//! Turn dispatcher
//!
//! Owns the conversation state, feeds events through the pure transition
//! function and executes the resulting effects. At most one assistant request
//! is in flight at a time; submissions that arrive meanwhile are dropped.

#[cfg(test)]
pub mod testing;

use crate::client::{AssistantClient, AssistantError, AssistantErrorKind, ChatReply, ChatRequest};
use crate::quick_actions::QuickActionCatalog;
use crate::state_machine::{transition, ChatState, Effect, Event, TransitionError};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// What a call to [`Dispatcher::send`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant answered and its reply was appended
    Replied,
    /// The request failed and the fallback turn was appended
    FellBack,
    /// Nothing happened
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    EmptyInput,
    Busy,
    UnknownQuickAction,
    /// Any other refusal from the state machine, passed through as is
    Rejected(TransitionError),
}

impl From<TransitionError> for DropReason {
    fn from(error: TransitionError) -> Self {
        match error {
            TransitionError::EmptyInput => Self::EmptyInput,
            TransitionError::Busy => Self::Busy,
            other @ TransitionError::NoRequestInFlight => Self::Rejected(other),
        }
    }
}

/// State shared between the dispatcher and its in-flight request task
struct Shared {
    state: Mutex<ChatState>,
    updates: watch::Sender<ChatState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one event under the state lock and publish the new snapshot.
    /// The lock is never held across an await.
    fn apply(&self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let mut state = self.lock();
        let result = transition(&state, event)?;
        *state = result.new_state;
        self.updates.send_replace(state.clone());
        Ok(result.effects)
    }
}

/// Settles the in-flight request exactly once.
///
/// Dropping it unsettled, which happens if the request task panics or is
/// torn down, applies the fallback so `pending` is always released.
struct InFlight {
    shared: Arc<Shared>,
    settled: bool,
}

impl InFlight {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            settled: false,
        }
    }

    fn settle(mut self, event: Event) {
        self.settled = true;
        match self.shared.apply(event) {
            Ok(effects) => effects.into_iter().for_each(note_effect),
            Err(e) => tracing::error!(error = %e, "Settlement rejected"),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::error!("Assistant request ended without settling, showing fallback");
        let event = Event::RequestFailed {
            kind: AssistantErrorKind::Transport,
            at: Utc::now(),
        };
        if let Err(e) = self.shared.apply(event) {
            tracing::error!(error = %e, "Fallback settlement rejected");
        }
    }
}

/// Conversational session manager for one widget instance
pub struct Dispatcher<C: AssistantClient + 'static> {
    shared: Arc<Shared>,
    client: Arc<C>,
}

impl<C: AssistantClient + 'static> Dispatcher<C> {
    /// Start a fresh conversation
    pub fn new(client: C) -> Self {
        Self::with_state(client, ChatState::new(Utc::now()))
    }

    pub fn with_state(client: C, state: ChatState) -> Self {
        let (updates, _) = watch::channel(state.clone());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                updates,
            }),
            client: Arc::new(client),
        }
    }

    /// Receive a fresh snapshot after every applied transition
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.shared.updates.subscribe()
    }

    pub fn snapshot(&self) -> ChatState {
        self.shared.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.lock().is_pending()
    }

    /// Submit the phrase of catalog entry `index`, exactly as if typed
    pub async fn invoke_quick_action(&self, index: usize) -> SendOutcome {
        match QuickActionCatalog::get(index) {
            Some(action) => self.send(action.phrase()).await,
            None => {
                tracing::debug!(index, "Dropping unknown quick action");
                SendOutcome::Dropped(DropReason::UnknownQuickAction)
            }
        }
    }

    /// Submit one user message.
    ///
    /// Blank text, or text sent while a request is in flight, is dropped
    /// without touching the conversation. Otherwise the user turn is
    /// appended, one request is issued, and its reply or the fallback turn is
    /// appended once it settles.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let event = Event::UserSubmit {
            text: text.to_string(),
            at: Utc::now(),
        };
        let effects = match self.shared.apply(event) {
            Ok(effects) => effects,
            Err(e) => {
                tracing::debug!(reason = %e, "Dropping message");
                return SendOutcome::Dropped(e.into());
            }
        };

        let mut outcome = SendOutcome::Dropped(DropReason::Busy);
        for effect in effects {
            if let Some(resolved) = self.execute_effect(effect).await {
                outcome = resolved;
            }
        }
        outcome
    }

    async fn execute_effect(&self, effect: Effect) -> Option<SendOutcome> {
        match effect {
            Effect::RequestAssistant { request } => Some(self.request_assistant(request).await),
            other => {
                note_effect(other);
                None
            }
        }
    }

    /// Run the request on its own task so the settlement survives the caller
    /// dropping the `send` future
    async fn request_assistant(&self, request: ChatRequest) -> SendOutcome {
        let in_flight = InFlight::new(Arc::clone(&self.shared));
        let client = Arc::clone(&self.client);

        let task = tokio::spawn(async move {
            let result = client.chat(&request).await;
            let (event, outcome) = settlement(result);
            in_flight.settle(event);
            outcome
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Assistant request task failed");
                SendOutcome::FellBack
            }
        }
    }
}

/// Turn a finished call into the event that settles it
fn settlement(result: Result<ChatReply, AssistantError>) -> (Event, SendOutcome) {
    let now = Utc::now();
    match result {
        Ok(reply) => {
            let timestamp = reply.parsed_timestamp().unwrap_or_else(|| {
                tracing::warn!(raw = %reply.timestamp, "Unreadable reply timestamp, using receipt time");
                now
            });
            let event = Event::ReplyReceived {
                content: reply.response,
                timestamp,
                session_id: reply.session_id,
            };
            (event, SendOutcome::Replied)
        }
        Err(e) => {
            tracing::warn!(kind = %e.kind, error = %e.message, "Assistant unavailable, showing fallback");
            let event = Event::RequestFailed {
                kind: e.kind,
                at: now,
            };
            (event, SendOutcome::FellBack)
        }
    }
}

fn note_effect(effect: Effect) {
    match effect {
        Effect::SessionCommitted { session_id } => {
            tracing::info!(session_id = %session_id, "Session started");
        }
        Effect::SessionMismatch { kept, ignored } => {
            tracing::debug!(session_id = %kept, ignored = %ignored, "Ignoring different session token");
        }
        Effect::RequestAssistant { .. } => {
            tracing::error!("Request effect produced by a settlement");
        }
    }
}

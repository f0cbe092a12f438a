//! Pure state transition function

use super::fallback::fallback_turn;
use super::state::Turn;
use super::{ChatState, Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Events the current state refuses. Rejection never changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("message is empty")]
    EmptyInput,
    #[error("a request is already in flight")]
    Busy,
    #[error("no request is in flight")]
    NoRequestInFlight,
}

/// Pure transition function
///
/// Given the same state and event it always produces the same result, with
/// no I/O. The caller applies `new_state` and executes the effects.
pub fn transition(state: &ChatState, event: Event) -> Result<TransitionResult, TransitionError> {
    match event {
        // Idle + submit -> pending, with the user turn appended before the
        // request is issued
        Event::UserSubmit { text, at } => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            if state.pending {
                return Err(TransitionError::Busy);
            }

            let effect = Effect::request_assistant(state.session.current(), text.as_str());
            let mut new_state = state.clone();
            new_state.log.append(Turn::user(text, at));
            new_state.pending = true;

            Ok(TransitionResult::new(new_state).with_effect(effect))
        }

        Event::ReplyReceived {
            content,
            timestamp,
            session_id,
        } => {
            if !state.pending {
                return Err(TransitionError::NoRequestInFlight);
            }

            let mut new_state = state.clone();
            new_state.log.append(Turn::assistant(content, timestamp));
            new_state.pending = false;

            let effect = match state.session.current() {
                None => new_state
                    .session
                    .commit_if_absent(&session_id)
                    .then(|| Effect::SessionCommitted { session_id }),
                Some(kept) if kept != session_id => Some(Effect::SessionMismatch {
                    kept: kept.to_string(),
                    ignored: session_id,
                }),
                Some(_) => None,
            };

            let result = TransitionResult::new(new_state);
            Ok(match effect {
                Some(effect) => result.with_effect(effect),
                None => result,
            })
        }

        // Every failure kind collapses into the same fallback turn; the
        // session is left untouched
        Event::RequestFailed { at, .. } => {
            if !state.pending {
                return Err(TransitionError::NoRequestInFlight);
            }

            let mut new_state = state.clone();
            new_state.log.append(fallback_turn(at));
            new_state.pending = false;

            Ok(TransitionResult::new(new_state))
        }
    }
}

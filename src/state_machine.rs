//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
mod fallback;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use fallback::{fallback_turn, FALLBACK_MESSAGE};
pub use state::{ChatState, MessageLog, Role, SessionStore, Turn, GREETING};
pub use transition::{transition, TransitionError, TransitionResult};

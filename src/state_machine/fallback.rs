//! The one assistant message shown for every failed request

use super::state::Turn;
use chrono::{DateTime, Utc};

/// Shown verbatim whatever went wrong: transport, status or payload
pub const FALLBACK_MESSAGE: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again in a moment! 🙏";

/// Fallback assistant turn stamped with the time of the failure
pub fn fallback_turn(at: DateTime<Utc>) -> Turn {
    Turn::assistant(FALLBACK_MESSAGE, at)
}

//! Menu Chat - conversational session manager for a remote menu assistant
//!
//! A pure state machine owns the conversation (message log, session token,
//! pending flag); the dispatcher feeds it user input and assistant results
//! and runs the one request it allows in flight at a time.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod quick_actions;
pub mod state_machine;
pub mod view;

//! chat_state - Session lifecycle state machine
//!
//! Tracks where an authenticated session stands: signed out, holding a valid
//! access token, holding an expired one, or failed to refresh.

pub mod machine;

pub use machine::{SessionEvent, SessionMachine, SessionPhase, StateTransition};

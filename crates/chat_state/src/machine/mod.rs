//! State machine module
//!
//! Contains the FSM implementation for the session lifecycle.

mod events;
mod states;
mod transitions;

pub use events::SessionEvent;
pub use states::SessionPhase;
pub use transitions::{SessionMachine, StateTransition};

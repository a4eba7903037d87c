//! State transitions - FSM transition logic
//!
//! Unknown (phase, event) pairs leave the phase untouched; the transition is
//! still recorded with `changed == false`.

use tracing::debug;

use super::events::SessionEvent;
use super::states::SessionPhase;

const DEFAULT_MAX_HISTORY: usize = 50;

/// Represents a state transition result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    /// The phase before the transition.
    pub from: SessionPhase,
    /// The phase after the transition.
    pub to: SessionPhase,
    /// The event that triggered the transition.
    pub event: SessionEvent,
    /// Whether the phase actually changed.
    pub changed: bool,
}

/// State machine for the session lifecycle.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    current: SessionPhase,
    history: Vec<StateTransition>,
    max_history: usize,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    /// Create a new state machine in the Unauthenticated phase.
    pub fn new() -> Self {
        Self::with_phase(SessionPhase::Unauthenticated)
    }

    pub fn with_phase(phase: SessionPhase) -> Self {
        Self {
            current: phase,
            history: Vec::new(),
            max_history: DEFAULT_MAX_HISTORY,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.current
    }

    /// Transition history, oldest first, bounded.
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Handle an event and transition to the next phase.
    pub fn handle_event(&mut self, event: SessionEvent) -> StateTransition {
        let from = self.current;
        let to = Self::next_phase(from, &event);
        let changed = from != to;
        self.current = to;

        if changed {
            debug!("session phase {from} -> {to} on {event}");
        }

        let transition = StateTransition {
            from,
            to,
            event,
            changed,
        };

        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }

    fn next_phase(phase: SessionPhase, event: &SessionEvent) -> SessionPhase {
        use SessionEvent as E;
        use SessionPhase as P;

        match (phase, event) {
            // Logging in again replaces whatever session was there
            (P::Unauthenticated | P::Active | P::Stale, E::LoginSucceeded) => P::Active,

            (P::Active, E::AccessExpired) => P::Stale,

            (P::Stale, E::RefreshSucceeded) => P::Active,
            (P::Stale, E::RefreshFailed { .. }) => P::RefreshFailed,

            (_, E::SignedOut) => P::Unauthenticated,

            _ => phase,
        }
    }
}

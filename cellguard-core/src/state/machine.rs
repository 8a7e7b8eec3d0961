//! Severity ladder definition
//!
//! The monitor's externally visible state is a function of the current
//! state and the escalation events raised during a cycle.

use super::events::Event;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Monitor severity states, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum State {
    /// All monitored channels within limits (or not yet debounced)
    #[default]
    Normal = 0,
    /// A channel stayed out of range past its warning threshold
    Warning = 1,
    /// A channel stayed out of range past its fault threshold; latched
    Fault = 2,
    /// Fault judged unrecoverable by the shutdown policy; latched
    Shutdown = 3,
}

impl State {
    /// Every state, in ladder order
    pub const ALL: [State; 4] = [State::Normal, State::Warning, State::Fault, State::Shutdown];

    /// Encode as the 2-bit state register value
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a 2-bit state register value
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(State::Normal),
            1 => Some(State::Warning),
            2 => Some(State::Fault),
            3 => Some(State::Shutdown),
            _ => None,
        }
    }

    /// Upper-case name used in reports
    pub const fn name(self) -> &'static str {
        match self {
            State::Normal => "NORMAL",
            State::Warning => "WARNING",
            State::Fault => "FAULT",
            State::Shutdown => "SHUTDOWN",
        }
    }

    /// Check if this state holds a latched fault
    pub fn is_latched(&self) -> bool {
        matches!(self, State::Fault | State::Shutdown)
    }

    /// Process an event and return the next state
    ///
    /// This is the core transition logic. Anything not listed keeps the
    /// current state, so severity never drops without a manual reset.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // Manual reset always wins
            (_, ManualReset) => Normal,

            // Warning only leaves Normal; it is a no-op once latched
            (Normal, WarningDebounced(_)) => Warning,

            // Fault escalation from either unlatched state
            (Normal, FaultDebounced(_)) => Fault,
            (Warning, FaultDebounced(_)) => Fault,

            // Shutdown only from a latched fault
            (Fault, ShutdownRequired(_)) => Shutdown,

            // Default: stay in current state
            _ => self,
        }
    }
}

impl core::fmt::Display for State {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::Channel;

    #[test]
    fn test_normal_to_warning() {
        let next = State::Normal.transition(Event::WarningDebounced(Channel::Voltage));
        assert_eq!(next, State::Warning);
    }

    #[test]
    fn test_warning_is_noop_when_latched() {
        for state in [State::Warning, State::Fault, State::Shutdown] {
            let next = state.transition(Event::WarningDebounced(Channel::Current));
            assert_eq!(next, state);
        }
    }

    #[test]
    fn test_fault_from_unlatched_states() {
        for state in [State::Normal, State::Warning] {
            let next = state.transition(Event::FaultDebounced(Channel::Temperature));
            assert_eq!(next, State::Fault);
        }
    }

    #[test]
    fn test_fault_does_not_leave_shutdown() {
        let next = State::Shutdown.transition(Event::FaultDebounced(Channel::Voltage));
        assert_eq!(next, State::Shutdown);
    }

    #[test]
    fn test_shutdown_requires_fault() {
        assert_eq!(
            State::Fault.transition(Event::ShutdownRequired(Channel::Temperature)),
            State::Shutdown
        );
        assert_eq!(
            State::Warning.transition(Event::ShutdownRequired(Channel::Temperature)),
            State::Warning
        );
    }

    #[test]
    fn test_manual_reset_from_any_state() {
        for state in State::ALL {
            assert_eq!(state.transition(Event::ManualReset), State::Normal);
        }
    }

    #[test]
    fn test_ladder_order() {
        assert!(State::Normal < State::Warning);
        assert!(State::Warning < State::Fault);
        assert!(State::Fault < State::Shutdown);
    }

    #[test]
    fn test_register_encoding() {
        for state in State::ALL {
            assert_eq!(State::from_u8(state.as_u8()), Some(state));
        }
        assert_eq!(State::from_u8(4), None);
    }

    #[test]
    fn test_latched() {
        assert!(!State::Normal.is_latched());
        assert!(!State::Warning.is_latched());
        assert!(State::Fault.is_latched());
        assert!(State::Shutdown.is_latched());
    }
}

//! Events that trigger severity transitions

use crate::safety::Channel;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Debounce events
    /// Channel counter reached its warning threshold
    WarningDebounced(Channel),
    /// Channel counter reached its fault threshold
    FaultDebounced(Channel),

    // Policy events
    /// Shutdown policy declared the fault unrecoverable
    ShutdownRequired(Channel),

    // Operator events
    /// Supervisor asserted manual reset
    ManualReset,
}

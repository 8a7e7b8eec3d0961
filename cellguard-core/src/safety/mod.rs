//! Safety monitoring
//!
//! Debounces out-of-range readings per channel and escalates the severity
//! state of the pack.

pub mod channel;
pub mod monitor;

pub use channel::{Channel, DebounceCounter, FaultCode, CHANNEL_COUNT};
pub use monitor::{
    FaultMonitor, MonitorEvent, MonitorInputs, MonitorOutputs, MAX_EVENTS_PER_CYCLE,
};

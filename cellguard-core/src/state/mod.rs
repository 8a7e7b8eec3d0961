//! Severity state machine
//!
//! Defines the severity ladder the fault monitor walks. The state machine
//! is explicit, finite, and deterministic: severity only moves up on
//! escalation events and only collapses back to normal on manual reset.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::State;

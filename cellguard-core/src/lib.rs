//! Board-agnostic core logic for battery pack fault monitoring
//!
//! This crate contains the fault state machine and everything it needs
//! that does not depend on a specific driver or board:
//!
//! - Severity ladder and its transition rules
//! - Monitored channels, priority ranking and debounce counters
//! - The per-cycle fault monitor
//! - Configuration types, validation and the binary config image

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod safety;
pub mod state;

pub use config::{ConfigError, MonitorConfig};
pub use safety::{
    Channel, FaultCode, FaultMonitor, MonitorEvent, MonitorInputs, MonitorOutputs,
};
pub use state::{Event, State};

//! Host-side driver for the cellguard fault monitor
//!
//! Provides everything that sits around the monitor on a bench:
//!
//! - Packed cell word layout
//! - Input port model and stimulus changes
//! - Clocked cycle driver with optional per-cycle trace
//! - Scripted scenarios, including the reference bench timeline
//! - TOML and binary config loading

pub mod config;
pub mod error;
pub mod pack;
pub mod scenario;
pub mod simulator;
pub mod stimulus;

pub use config::{load_config, parse_config, save_config_image};
pub use error::SimError;
pub use pack::CellPacking;
pub use scenario::{Phase, Scenario};
pub use simulator::{Report, Simulator, TraceRow};
pub use stimulus::{Change, Stimulus};

/// Cells in the reference pack
pub const REFERENCE_CELLS: usize = 4;

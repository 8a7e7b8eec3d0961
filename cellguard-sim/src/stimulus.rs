//! Driver-side input ports
//!
//! Mirrors the monitor's input pins as the driver holds them between
//! cycles: cells travel as one packed word and every other input as a
//! plain register.

use cellguard_core::{Channel, MonitorInputs};

use crate::pack::CellPacking;

/// Input port values held by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stimulus {
    /// Packed cell codes
    pub cell_word: u64,
    pub current_raw: u16,
    pub temp_raw: u16,
    pub mask_voltage: bool,
    pub mask_current: bool,
    pub mask_temp: bool,
    pub manual_reset: bool,
}

impl Stimulus {
    /// Set a channel's mask pin
    pub fn set_mask(&mut self, channel: Channel, masked: bool) {
        match channel {
            Channel::Voltage => self.mask_voltage = masked,
            Channel::Current => self.mask_current = masked,
            Channel::Temperature => self.mask_temp = masked,
        }
    }

    /// Sample the ports into the monitor's input vector
    pub fn sample<const N: usize>(&self, packing: &CellPacking) -> MonitorInputs<N> {
        MonitorInputs {
            cells: packing.unpack(self.cell_word),
            current_raw: self.current_raw,
            temp_raw: self.temp_raw,
            mask_voltage: self.mask_voltage,
            mask_current: self.mask_current,
            mask_temp: self.mask_temp,
            manual_reset: self.manual_reset,
        }
    }
}

/// One change applied to the ports (or reset line) at a phase boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Drive new cell codes
    Cells(Vec<u16>),
    /// Drive a new current code
    Current(u16),
    /// Drive a new temperature code
    Temperature(u16),
    /// Set or clear a channel mask
    Mask(Channel, bool),
    /// Assert or release manual reset
    ManualReset(bool),
    /// Hold (true) or release (false) power-on reset
    PowerOnReset(bool),
}

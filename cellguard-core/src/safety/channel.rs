//! Monitored channels, fault codes and debounce counters

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of monitored channels
pub const CHANNEL_COUNT: usize = 3;

/// One independently monitored physical quantity
///
/// Variants are declared in ascending priority, so the derived ordering
/// is the priority ranking: `Temperature > Current > Voltage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Channel {
    /// Aggregate over all cell voltages
    Voltage,
    /// Pack current
    Current,
    /// Pack temperature
    Temperature,
}

impl Channel {
    /// Channels in storage order
    pub const ALL: [Channel; CHANNEL_COUNT] =
        [Channel::Voltage, Channel::Current, Channel::Temperature];

    /// Channels from highest to lowest priority
    pub const BY_PRIORITY: [Channel; CHANNEL_COUNT] =
        [Channel::Temperature, Channel::Current, Channel::Voltage];

    /// Index into per-channel arrays
    pub const fn index(self) -> usize {
        match self {
            Channel::Voltage => 0,
            Channel::Current => 1,
            Channel::Temperature => 2,
        }
    }

    /// Fault code latched when this channel faults
    pub const fn code(self) -> FaultCode {
        match self {
            Channel::Voltage => FaultCode::Voltage,
            Channel::Current => FaultCode::Current,
            Channel::Temperature => FaultCode::Temperature,
        }
    }

    /// Upper-case name used in reports
    pub const fn name(self) -> &'static str {
        self.code().name()
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Latched fault code register
///
/// Ordered by severity rank, `None` lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum FaultCode {
    /// No fault latched
    #[default]
    None = 0,
    /// Cell voltage out of range
    Voltage = 1,
    /// Pack current out of range
    Current = 2,
    /// Pack temperature out of range
    Temperature = 3,
}

impl FaultCode {
    /// Encode as the 2-bit register value
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a 2-bit register value
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FaultCode::None),
            1 => Some(FaultCode::Voltage),
            2 => Some(FaultCode::Current),
            3 => Some(FaultCode::Temperature),
            _ => None,
        }
    }

    /// Channel this code belongs to
    pub const fn channel(self) -> Option<Channel> {
        match self {
            FaultCode::None => None,
            FaultCode::Voltage => Some(Channel::Voltage),
            FaultCode::Current => Some(Channel::Current),
            FaultCode::Temperature => Some(Channel::Temperature),
        }
    }

    /// Upper-case name used in reports
    pub const fn name(self) -> &'static str {
        match self {
            FaultCode::None => "NONE",
            FaultCode::Voltage => "VOLTAGE",
            FaultCode::Current => "CURRENT",
            FaultCode::Temperature => "TEMPERATURE",
        }
    }
}

impl core::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Consecutive out-of-range sample counter for one channel
///
/// Thresholds are detected on the rising edge, so a counter held past a
/// threshold reports it exactly once per excursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceCounter {
    /// Count before the latest sample
    previous: u32,
    /// Count after the latest sample
    count: u32,
}

impl DebounceCounter {
    /// Create a cleared counter
    pub const fn new() -> Self {
        Self {
            previous: 0,
            count: 0,
        }
    }

    /// Feed one sample
    ///
    /// Out-of-range samples advance the counter (saturating); an in-range
    /// sample clears it.
    pub fn sample(&mut self, out_of_range: bool) {
        self.previous = self.count;
        self.count = if out_of_range {
            self.count.saturating_add(1)
        } else {
            0
        };
    }

    /// Force the counter to zero
    pub fn clear(&mut self) {
        self.previous = 0;
        self.count = 0;
    }

    /// Current consecutive count
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Check if the latest sample carried the counter up to `threshold`
    pub const fn crossed(&self, threshold: u32) -> bool {
        self.previous < threshold && self.count >= threshold
    }
}

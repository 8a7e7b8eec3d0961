//! Configuration type definitions
//!
//! These types describe how the monitor judges raw readings. They are
//! validated once, when a monitor is built, and never change afterwards.

use crate::safety::Channel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of monitored cells
pub const MAX_CELLS: usize = 16;

/// Widest supported raw code, in bits
pub const MAX_ADC_WIDTH: u8 = 16;

/// Default raw code width
pub const DEFAULT_ADC_WIDTH: u8 = 12;

/// Default warning debounce (cycles)
pub const DEFAULT_WARNING_CYCLES: u32 = 8;

/// Default fault debounce (cycles)
pub const DEFAULT_FAULT_CYCLES: u32 = 32;

/// Inclusive window of raw codes considered in range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelLimits {
    /// Lowest in-range code
    pub min: u16,
    /// Highest in-range code
    pub max: u16,
}

impl ChannelLimits {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// Check a raw code against the window
    pub const fn contains(&self, raw: u16) -> bool {
        raw >= self.min && raw <= self.max
    }
}

/// Debounce thresholds, in consecutive out-of-range cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebounceThresholds {
    /// Cycles before a NORMAL monitor moves to WARNING
    pub warning_cycles: u32,
    /// Cycles before the channel raises a fault
    pub fault_cycles: u32,
}

impl Default for DebounceThresholds {
    fn default() -> Self {
        Self {
            warning_cycles: DEFAULT_WARNING_CYCLES,
            fault_cycles: DEFAULT_FAULT_CYCLES,
        }
    }
}

/// Per-channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelConfig {
    /// In-range window
    pub limits: ChannelLimits,
    /// Debounce thresholds
    #[cfg_attr(feature = "serde", serde(default))]
    pub debounce: DebounceThresholds,
}

impl ChannelConfig {
    pub const fn new(min: u16, max: u16) -> Self {
        Self {
            limits: ChannelLimits::new(min, max),
            debounce: DebounceThresholds {
                warning_cycles: DEFAULT_WARNING_CYCLES,
                fault_cycles: DEFAULT_FAULT_CYCLES,
            },
        }
    }

    /// Replace the debounce thresholds
    pub const fn with_debounce(mut self, warning_cycles: u32, fault_cycles: u32) -> Self {
        self.debounce = DebounceThresholds {
            warning_cycles,
            fault_cycles,
        };
        self
    }
}

/// When a latched fault becomes a shutdown
///
/// Both triggers are optional; with neither set the monitor never
/// leaves FAULT on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShutdownPolicy {
    /// Shut down when a faulted channel stays out of range this many cycles
    ///
    /// Must be longer than every channel's fault threshold.
    #[cfg_attr(feature = "serde", serde(default))]
    pub persist_cycles: Option<u32>,
    /// Shut down as soon as this channel faults
    #[cfg_attr(feature = "serde", serde(default))]
    pub critical_channel: Option<Channel>,
}

impl ShutdownPolicy {
    /// Policy that never shuts down
    pub const fn disabled() -> Self {
        Self {
            persist_cycles: None,
            critical_channel: None,
        }
    }
}

/// What manual reset does to the cumulative counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CounterResetPolicy {
    /// Counters survive manual reset for the whole session
    #[default]
    Preserve,
    /// Manual reset zeroes the counters and the last fault cycle
    Clear,
}

/// Complete monitor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// Width of every raw code, in bits
    pub adc_width: u8,
    /// Counter behavior on manual reset
    pub counter_reset: CounterResetPolicy,
    /// Cell voltage channel (applied to every cell)
    pub voltage: ChannelConfig,
    /// Pack current channel
    pub current: ChannelConfig,
    /// Pack temperature channel
    pub temperature: ChannelConfig,
    /// Shutdown triggers
    pub shutdown: ShutdownPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            adc_width: DEFAULT_ADC_WIDTH,
            counter_reset: CounterResetPolicy::Preserve,
            voltage: ChannelConfig::new(300, 420),
            current: ChannelConfig::new(0, 200),
            temperature: ChannelConfig::new(0, 60),
            shutdown: ShutdownPolicy::disabled(),
        }
    }
}

impl MonitorConfig {
    /// Configuration for one channel
    pub const fn channel(&self, channel: Channel) -> &ChannelConfig {
        match channel {
            Channel::Voltage => &self.voltage,
            Channel::Current => &self.current,
            Channel::Temperature => &self.temperature,
        }
    }

    /// Largest raw code representable at `adc_width`
    pub const fn code_mask(&self) -> u16 {
        if self.adc_width >= MAX_ADC_WIDTH {
            u16::MAX
        } else {
            ((1u32 << self.adc_width) - 1) as u16
        }
    }

    /// Validate the configuration for a pack of `cell_count` cells
    pub fn validate(&self, cell_count: usize) -> Result<(), ConfigError> {
        if cell_count == 0 {
            return Err(ConfigError::NoCells);
        }
        if cell_count > MAX_CELLS {
            return Err(ConfigError::TooManyCells(cell_count));
        }
        if self.adc_width == 0 || self.adc_width > MAX_ADC_WIDTH {
            return Err(ConfigError::InvalidAdcWidth(self.adc_width));
        }

        let code_max = self.code_mask();
        for channel in Channel::ALL {
            let cfg = self.channel(channel);
            if cfg.debounce.warning_cycles == 0 || cfg.debounce.fault_cycles == 0 {
                return Err(ConfigError::ZeroDebounce(channel));
            }
            if cfg.debounce.fault_cycles < cfg.debounce.warning_cycles {
                return Err(ConfigError::FaultBeforeWarning(channel));
            }
            if cfg.limits.min > cfg.limits.max {
                return Err(ConfigError::EmptyWindow(channel));
            }
            if cfg.limits.max > code_max {
                return Err(ConfigError::LimitOutOfRange(channel));
            }
            if let Some(persist) = self.shutdown.persist_cycles {
                if persist <= cfg.debounce.fault_cycles {
                    return Err(ConfigError::ShutdownTooShort(channel));
                }
            }
        }

        Ok(())
    }
}

/// Configuration rejected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pack has no cells
    NoCells,
    /// More cells than `MAX_CELLS`
    TooManyCells(usize),
    /// Code width outside 1..=16 bits
    InvalidAdcWidth(u8),
    /// A debounce threshold is zero
    ZeroDebounce(Channel),
    /// Fault threshold shorter than the warning threshold
    FaultBeforeWarning(Channel),
    /// Window minimum above its maximum
    EmptyWindow(Channel),
    /// Window maximum not representable at the configured width
    LimitOutOfRange(Channel),
    /// Shutdown persistence not longer than the channel's fault threshold
    ShutdownTooShort(Channel),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::NoCells => write!(f, "cell count must be at least 1"),
            ConfigError::TooManyCells(n) => {
                write!(f, "cell count {} exceeds maximum of {}", n, MAX_CELLS)
            }
            ConfigError::InvalidAdcWidth(w) => {
                write!(f, "adc width {} outside 1..={}", w, MAX_ADC_WIDTH)
            }
            ConfigError::ZeroDebounce(ch) => write!(f, "{} debounce thresholds must be > 0", ch),
            ConfigError::FaultBeforeWarning(ch) => {
                write!(f, "{} fault threshold is below its warning threshold", ch)
            }
            ConfigError::EmptyWindow(ch) => write!(f, "{} limits have min > max", ch),
            ConfigError::LimitOutOfRange(ch) => {
                write!(f, "{} limit exceeds the adc code range", ch)
            }
            ConfigError::ShutdownTooShort(ch) => write!(
                f,
                "shutdown persistence must exceed the {} fault threshold",
                ch
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(MonitorConfig::default().validate(4), Ok(()));
    }

    #[test]
    fn test_default_limits_match_nominal_pack() {
        let config = MonitorConfig::default();
        assert!(config.voltage.limits.contains(360));
        assert!(!config.voltage.limits.contains(280));
        assert!(config.current.limits.contains(100));
        assert!(!config.current.limits.contains(220));
        assert!(config.temperature.limits.contains(40));
        assert!(!config.temperature.limits.contains(90));
    }

    #[test]
    fn test_cell_count_bounds() {
        let config = MonitorConfig::default();
        assert_eq!(config.validate(0), Err(ConfigError::NoCells));
        assert_eq!(config.validate(17), Err(ConfigError::TooManyCells(17)));
        assert_eq!(config.validate(MAX_CELLS), Ok(()));
    }

    #[test]
    fn test_adc_width_bounds() {
        let mut config = MonitorConfig::default();
        config.adc_width = 0;
        assert_eq!(config.validate(4), Err(ConfigError::InvalidAdcWidth(0)));
        config.adc_width = 17;
        assert_eq!(config.validate(4), Err(ConfigError::InvalidAdcWidth(17)));
    }

    #[test]
    fn test_code_mask() {
        let mut config = MonitorConfig::default();
        assert_eq!(config.code_mask(), 0x0FFF);
        config.adc_width = 16;
        assert_eq!(config.code_mask(), 0xFFFF);
        config.adc_width = 1;
        assert_eq!(config.code_mask(), 1);
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let mut config = MonitorConfig::default();
        config.current = config.current.with_debounce(0, 10);
        assert_eq!(
            config.validate(4),
            Err(ConfigError::ZeroDebounce(Channel::Current))
        );
    }

    #[test]
    fn test_fault_before_warning_rejected() {
        let mut config = MonitorConfig::default();
        config.temperature = config.temperature.with_debounce(10, 5);
        assert_eq!(
            config.validate(4),
            Err(ConfigError::FaultBeforeWarning(Channel::Temperature))
        );
    }

    #[test]
    fn test_window_checks() {
        let mut config = MonitorConfig::default();
        config.voltage.limits = ChannelLimits::new(400, 300);
        assert_eq!(
            config.validate(4),
            Err(ConfigError::EmptyWindow(Channel::Voltage))
        );

        let mut config = MonitorConfig::default();
        config.voltage.limits = ChannelLimits::new(0, 5000);
        assert_eq!(
            config.validate(4),
            Err(ConfigError::LimitOutOfRange(Channel::Voltage))
        );
    }

    #[test]
    fn test_shutdown_persistence_must_exceed_fault() {
        let mut config = MonitorConfig::default();
        config.shutdown.persist_cycles = Some(DEFAULT_FAULT_CYCLES);
        assert_eq!(
            config.validate(4),
            Err(ConfigError::ShutdownTooShort(Channel::Voltage))
        );

        config.shutdown.persist_cycles = Some(DEFAULT_FAULT_CYCLES + 1);
        assert_eq!(config.validate(4), Ok(()));
    }

    #[test]
    fn test_channel_accessors() {
        let mut config = MonitorConfig::default();
        config.current.limits.max = 250;
        assert_eq!(config.channel(Channel::Current).limits.max, 250);
    }
}

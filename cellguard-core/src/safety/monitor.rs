//! Fault monitor implementation
//!
//! Monitors cell voltages, pack current and pack temperature once per
//! cycle. Each channel's out-of-range samples are debounced; debounced
//! channels escalate the severity state, latch a fault code and bump the
//! session counters.

use heapless::Vec;

use super::channel::{Channel, DebounceCounter, FaultCode, CHANNEL_COUNT};
use crate::config::{ConfigError, CounterResetPolicy, MonitorConfig};
use crate::state::{Event, State};

/// Upper bound on events raised by a single evaluation
///
/// One warning transition, a fault per channel and one shutdown; a manual
/// reset cycle raises only the reset.
pub const MAX_EVENTS_PER_CYCLE: usize = 1 + CHANNEL_COUNT + 1;

/// Input vector sampled on one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorInputs<const N: usize> {
    /// Raw per-cell codes
    pub cells: [u16; N],
    /// Raw pack current code
    pub current_raw: u16,
    /// Raw pack temperature code
    pub temp_raw: u16,
    /// Disable voltage detection
    pub mask_voltage: bool,
    /// Disable current detection
    pub mask_current: bool,
    /// Disable temperature detection
    pub mask_temp: bool,
    /// Force return to NORMAL; overrides everything else while held
    pub manual_reset: bool,
}

impl<const N: usize> MonitorInputs<N> {
    /// Unmasked inputs with the given readings
    pub const fn new(cells: [u16; N], current_raw: u16, temp_raw: u16) -> Self {
        Self {
            cells,
            current_raw,
            temp_raw,
            mask_voltage: false,
            mask_current: false,
            mask_temp: false,
            manual_reset: false,
        }
    }

    /// Check if a channel's detection is masked
    pub const fn is_masked(&self, channel: Channel) -> bool {
        match channel {
            Channel::Voltage => self.mask_voltage,
            Channel::Current => self.mask_current,
            Channel::Temperature => self.mask_temp,
        }
    }

    /// Set a channel's mask flag
    pub fn set_mask(&mut self, channel: Channel, masked: bool) {
        match channel {
            Channel::Voltage => self.mask_voltage = masked,
            Channel::Current => self.mask_current = masked,
            Channel::Temperature => self.mask_temp = masked,
        }
    }
}

/// Output vector produced by one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorOutputs {
    /// Severity state
    pub state: State,
    /// True iff `state` is FAULT or SHUTDOWN
    pub fault_latched: bool,
    /// Latched fault code
    pub active_fault_code: FaultCode,
    /// Cumulative fault-level escalations
    pub fault_count: u32,
    /// Cumulative NORMAL to WARNING transitions
    pub warning_count: u32,
    /// Cycle of the most recent fault-level escalation
    pub last_fault_cycle: u64,
}

/// Domain event raised during an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorEvent {
    /// Monitor moved from NORMAL to WARNING because of this channel
    Warning(Channel),
    /// Channel reached its fault threshold
    ///
    /// `latched` is set when its code became the active fault code.
    Fault { channel: Channel, latched: bool },
    /// Shutdown policy fired on this channel
    Shutdown(Channel),
    /// Manual reset was applied
    ManualReset,
}

/// Cycle-stepped battery fault monitor
///
/// `N` is the number of monitored cells. Each instance owns all of its
/// state; independent instances never share anything.
#[derive(Debug, Clone)]
pub struct FaultMonitor<const N: usize> {
    config: MonitorConfig,
    /// Mask applied to every raw code
    code_mask: u16,
    state: State,
    active_fault_code: FaultCode,
    counters: [DebounceCounter; CHANNEL_COUNT],
    fault_count: u32,
    warning_count: u32,
    last_fault_cycle: u64,
    /// Events raised by the latest evaluation
    events: Vec<MonitorEvent, MAX_EVENTS_PER_CYCLE>,
}

impl<const N: usize> FaultMonitor<N> {
    /// Build a monitor in its power-on state
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate(N)?;

        Ok(Self {
            config,
            code_mask: config.code_mask(),
            state: State::Normal,
            active_fault_code: FaultCode::None,
            counters: [DebounceCounter::new(); CHANNEL_COUNT],
            fault_count: 0,
            warning_count: 0,
            last_fault_cycle: 0,
            events: Vec::new(),
        })
    }

    /// Return every register to its power-on value, counters included
    pub fn power_on_reset(&mut self) {
        self.state = State::Normal;
        self.active_fault_code = FaultCode::None;
        self.clear_debounce();
        self.clear_counters();
        self.events.clear();
    }

    /// Run one evaluation cycle
    ///
    /// Must be called once per cycle with increasing `cycle` values.
    pub fn evaluate(&mut self, inputs: &MonitorInputs<N>, cycle: u64) -> MonitorOutputs {
        self.events.clear();

        if inputs.manual_reset {
            self.apply_manual_reset();
            return self.outputs();
        }

        self.sample(inputs);
        self.escalate_warnings();
        self.escalate_faults(cycle);
        self.check_shutdown();

        self.outputs()
    }

    /// Snapshot of the output vector
    pub fn outputs(&self) -> MonitorOutputs {
        MonitorOutputs {
            state: self.state,
            fault_latched: self.state.is_latched(),
            active_fault_code: self.active_fault_code,
            fault_count: self.fault_count,
            warning_count: self.warning_count,
            last_fault_cycle: self.last_fault_cycle,
        }
    }

    /// Events raised by the latest evaluation
    pub fn events(&self) -> &[MonitorEvent] {
        &self.events
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn active_fault_code(&self) -> FaultCode {
        self.active_fault_code
    }

    pub fn fault_count(&self) -> u32 {
        self.fault_count
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    pub fn last_fault_cycle(&self) -> u64 {
        self.last_fault_cycle
    }

    /// Current consecutive out-of-range count for a channel
    pub fn debounce_count(&self, channel: Channel) -> u32 {
        self.counters[channel.index()].count()
    }

    fn apply_manual_reset(&mut self) {
        self.state = self.state.transition(Event::ManualReset);
        self.active_fault_code = FaultCode::None;
        self.clear_debounce();
        if self.config.counter_reset == CounterResetPolicy::Clear {
            self.clear_counters();
        }
        self.raise(MonitorEvent::ManualReset);
    }

    fn sample(&mut self, inputs: &MonitorInputs<N>) {
        for channel in Channel::ALL {
            if inputs.is_masked(channel) {
                self.counters[channel.index()].clear();
                continue;
            }
            let out_of_range = self.out_of_range(channel, inputs);
            self.counters[channel.index()].sample(out_of_range);
        }
    }

    fn out_of_range(&self, channel: Channel, inputs: &MonitorInputs<N>) -> bool {
        let limits = self.config.channel(channel).limits;
        let mask = self.code_mask;

        match channel {
            Channel::Voltage => inputs.cells.iter().any(|&raw| !limits.contains(raw & mask)),
            Channel::Current => !limits.contains(inputs.current_raw & mask),
            Channel::Temperature => !limits.contains(inputs.temp_raw & mask),
        }
    }

    fn escalate_warnings(&mut self) {
        for channel in Channel::BY_PRIORITY {
            let threshold = self.config.channel(channel).debounce.warning_cycles;
            if !self.counters[channel.index()].crossed(threshold) {
                continue;
            }
            if self.state == State::Normal {
                self.state = self.state.transition(Event::WarningDebounced(channel));
                self.warning_count = self.warning_count.saturating_add(1);
                self.raise(MonitorEvent::Warning(channel));
            }
        }
    }

    fn escalate_faults(&mut self, cycle: u64) {
        for channel in Channel::BY_PRIORITY {
            let threshold = self.config.channel(channel).debounce.fault_cycles;
            if !self.counters[channel.index()].crossed(threshold) {
                continue;
            }

            self.state = self.state.transition(Event::FaultDebounced(channel));
            self.fault_count = self.fault_count.saturating_add(1);
            self.last_fault_cycle = cycle;

            // Highest rank wins; a lower channel never displaces the latch
            let latched = channel.code() > self.active_fault_code;
            if latched {
                self.active_fault_code = channel.code();
            }
            self.raise(MonitorEvent::Fault { channel, latched });

            if self.config.shutdown.critical_channel == Some(channel) {
                self.enter_shutdown(channel);
            }
        }
    }

    fn check_shutdown(&mut self) {
        let Some(persist) = self.config.shutdown.persist_cycles else {
            return;
        };

        // Only the latched fault can persist into shutdown
        let Some(channel) = self.active_fault_code.channel() else {
            return;
        };
        if self.counters[channel.index()].crossed(persist) {
            self.enter_shutdown(channel);
        }
    }

    fn enter_shutdown(&mut self, channel: Channel) {
        if self.state != State::Fault {
            return;
        }
        self.state = self.state.transition(Event::ShutdownRequired(channel));
        self.raise(MonitorEvent::Shutdown(channel));
    }

    fn raise(&mut self, event: MonitorEvent) {
        // Capacity covers the worst case of a single cycle
        let pushed = self.events.push(event).is_ok();
        debug_assert!(pushed, "event list overflow");
    }

    fn clear_debounce(&mut self) {
        for counter in &mut self.counters {
            counter.clear();
        }
    }

    fn clear_counters(&mut self) {
        self.fault_count = 0;
        self.warning_count = 0;
        self.last_fault_cycle = 0;
    }
}

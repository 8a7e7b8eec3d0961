//! Cycle driver
//!
//! Steps a `FaultMonitor` one evaluation per clock cycle from the current
//! port values, holding it in reset while the reset line is asserted.

use std::io::{self, Write};

use cellguard_core::{
    Channel, FaultCode, FaultMonitor, MonitorConfig, MonitorEvent, MonitorOutputs, State,
};
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::pack::CellPacking;
use crate::stimulus::{Change, Stimulus};

/// Maximum number of cycles kept in a trace
pub const MAX_TRACE_CYCLES: usize = 20_000;

/// Outputs and debounce state captured on one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRow {
    pub cycle: u64,
    /// Reset line was held on this cycle
    pub in_reset: bool,
    pub outputs: MonitorOutputs,
    /// Debounce counts in `Channel::ALL` order
    pub debounce: [u32; 3],
}

/// Final telemetry of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Cycles stepped, reset cycles included
    pub cycles: u64,
    pub outputs: MonitorOutputs,
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let out = &self.outputs;
        writeln!(f, "=== SIMULATION COMPLETE ===")?;
        writeln!(f, "Simulation ended at cycle {}", self.cycles)?;
        writeln!(f, "Final state:")?;
        writeln!(f, "  state_o = {}", out.state.as_u8())?;
        writeln!(f, "  fault_latched_o = {}", u8::from(out.fault_latched))?;
        writeln!(f, "  active_fault_code_o = {}", out.active_fault_code.as_u8())?;
        writeln!(f, "  fault_count_o = {}", out.fault_count)?;
        writeln!(f, "  warning_count_o = {}", out.warning_count)?;
        writeln!(f, "  last_fault_cycle_o = {}", out.last_fault_cycle)?;
        writeln!(f, "  State decoded: {}", out.state)?;
        write!(f, "  Fault code decoded: {}", out.active_fault_code)
    }
}

/// Clocked driver around one monitor instance
pub struct Simulator<const N: usize> {
    monitor: FaultMonitor<N>,
    packing: CellPacking,
    stimulus: Stimulus,
    cycle: u64,
    /// Power-on reset line asserted
    in_reset: bool,
    trace: Option<Vec<TraceRow>>,
    trace_overflow: bool,
}

impl<const N: usize> Simulator<N> {
    /// Build a driver with all ports at zero and reset released
    pub fn new(config: MonitorConfig) -> Result<Self, SimError> {
        let monitor = FaultMonitor::new(config)?;
        let packing = CellPacking::new(N, config.adc_width)?;

        Ok(Self {
            monitor,
            packing,
            stimulus: Stimulus::default(),
            cycle: 0,
            in_reset: false,
            trace: None,
            trace_overflow: false,
        })
    }

    /// Start recording a per-cycle trace
    pub fn enable_trace(&mut self) {
        if self.trace.is_none() {
            self.trace = Some(Vec::new());
        }
    }

    pub fn trace(&self) -> &[TraceRow] {
        self.trace.as_deref().unwrap_or(&[])
    }

    pub fn monitor(&self) -> &FaultMonitor<N> {
        &self.monitor
    }

    /// Cycles stepped so far
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Apply one port change
    pub fn apply(&mut self, change: &Change) -> Result<(), SimError> {
        debug!(cycle = self.cycle, ?change, "Apply stimulus");
        match change {
            Change::Cells(cells) => self.stimulus.cell_word = self.packing.pack(cells)?,
            Change::Current(raw) => self.stimulus.current_raw = *raw,
            Change::Temperature(raw) => self.stimulus.temp_raw = *raw,
            Change::Mask(channel, masked) => self.stimulus.set_mask(*channel, *masked),
            Change::ManualReset(asserted) => self.stimulus.manual_reset = *asserted,
            Change::PowerOnReset(asserted) => self.in_reset = *asserted,
        }
        Ok(())
    }

    /// Advance one clock cycle
    pub fn tick(&mut self) -> MonitorOutputs {
        let outputs = if self.in_reset {
            self.monitor.power_on_reset();
            self.monitor.outputs()
        } else {
            let inputs = self.stimulus.sample::<N>(&self.packing);
            let outputs = self.monitor.evaluate(&inputs, self.cycle);
            self.log_events();
            outputs
        };

        self.record(outputs);
        self.cycle += 1;
        outputs
    }

    /// Advance `cycles` clock cycles, returning the last outputs
    pub fn run(&mut self, cycles: u32) -> MonitorOutputs {
        let mut outputs = self.monitor.outputs();
        for _ in 0..cycles {
            outputs = self.tick();
        }
        outputs
    }

    pub fn report(&self) -> Report {
        Report {
            cycles: self.cycle,
            outputs: self.monitor.outputs(),
        }
    }

    /// Write the trace as CSV
    pub fn write_trace_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(
            w,
            "cycle,rst,state,fault_latched,active_fault_code,fault_count,warning_count,\
             last_fault_cycle,debounce_voltage,debounce_current,debounce_temp"
        )?;
        for row in self.trace() {
            let out = &row.outputs;
            writeln!(
                w,
                "{},{},{},{},{},{},{},{},{},{},{}",
                row.cycle,
                u8::from(row.in_reset),
                out.state.as_u8(),
                u8::from(out.fault_latched),
                out.active_fault_code.as_u8(),
                out.fault_count,
                out.warning_count,
                out.last_fault_cycle,
                row.debounce[0],
                row.debounce[1],
                row.debounce[2],
            )?;
        }
        w.flush()
    }

    fn record(&mut self, outputs: MonitorOutputs) {
        let Some(trace) = self.trace.as_mut() else {
            return;
        };

        if trace.len() >= MAX_TRACE_CYCLES {
            if !self.trace_overflow {
                warn!(
                    cycle = self.cycle,
                    limit = MAX_TRACE_CYCLES,
                    "Trace buffer full, later cycles not recorded"
                );
                self.trace_overflow = true;
            }
            return;
        }

        trace.push(TraceRow {
            cycle: self.cycle,
            in_reset: self.in_reset,
            outputs,
            debounce: Channel::ALL.map(|channel| self.monitor.debounce_count(channel)),
        });
    }

    fn log_events(&self) {
        let cycle = self.cycle;
        for event in self.monitor.events() {
            match *event {
                MonitorEvent::Warning(channel) => {
                    info!(cycle, %channel, "Escalated to {}", State::Warning);
                }
                MonitorEvent::Fault { channel, latched } => {
                    let code: FaultCode = self.monitor.active_fault_code();
                    warn!(cycle, %channel, latched, active = %code, "Fault debounced");
                }
                MonitorEvent::Shutdown(channel) => {
                    warn!(cycle, %channel, "Escalated to {}", State::Shutdown);
                }
                MonitorEvent::ManualReset => {
                    debug!(cycle, "Manual reset applied");
                }
            }
        }
    }
}

//! Stimulus scenarios
//!
//! A scenario is an ordered list of phases. Each phase applies a set of
//! port changes and then holds them for a fixed number of cycles.

use cellguard_core::Channel;
use tracing::info;

use crate::error::SimError;
use crate::simulator::{Report, Simulator};
use crate::stimulus::Change;

/// Nominal cell code of the reference pack
pub const NOMINAL_CELL: u16 = 360;
/// Nominal current code of the reference pack
pub const NOMINAL_CURRENT: u16 = 100;
/// Nominal temperature code of the reference pack
pub const NOMINAL_TEMP: u16 = 40;

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub label: &'static str,
    /// Applied in order before the first cycle of the phase
    pub changes: Vec<Change>,
    pub cycles: u32,
}

impl Phase {
    pub fn new(label: &'static str, changes: Vec<Change>, cycles: u32) -> Self {
        Self {
            label,
            changes,
            cycles,
        }
    }
}

/// Named sequence of phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: &'static str,
    pub phases: Vec<Phase>,
}

impl Scenario {
    /// Total cycles across all phases
    pub fn total_cycles(&self) -> u64 {
        self.phases.iter().map(|p| p.cycles as u64).sum()
    }

    /// Drive `sim` through every phase and report the final telemetry
    pub fn run<const N: usize>(&self, sim: &mut Simulator<N>) -> Result<Report, SimError> {
        info!(scenario = self.name, cycles = self.total_cycles(), "Starting scenario");

        for phase in &self.phases {
            info!(
                phase = phase.label,
                start = sim.cycle(),
                cycles = phase.cycles,
                "Phase"
            );
            for change in &phase.changes {
                sim.apply(change)?;
            }
            let out = sim.run(phase.cycles);
            info!(
                phase = phase.label,
                state = %out.state,
                code = %out.active_fault_code,
                "Phase complete"
            );
        }

        Ok(sim.report())
    }

    /// The bench timeline for a 4-cell pack
    ///
    /// Power-on reset, nominal running, a spike shorter than the debounce
    /// window, a sustained undervolt, an over-temperature event, an
    /// overcurrent event, a masked undervolt and finally a manual reset.
    pub fn reference() -> Self {
        let cells = |c: [u16; 4]| Change::Cells(c.to_vec());

        Self {
            name: "reference",
            phases: vec![
                Phase::new(
                    "power-on reset",
                    vec![
                        Change::PowerOnReset(true),
                        Change::ManualReset(false),
                        cells([NOMINAL_CELL; 4]),
                        Change::Current(NOMINAL_CURRENT),
                        Change::Temperature(NOMINAL_TEMP),
                        Change::Mask(Channel::Voltage, false),
                        Change::Mask(Channel::Current, false),
                        Change::Mask(Channel::Temperature, false),
                    ],
                    4,
                ),
                Phase::new("normal operation", vec![Change::PowerOnReset(false)], 100),
                Phase::new("transient spike", vec![cells([360, 290, 360, 360])], 4),
                Phase::new("spike recovery", vec![cells([NOMINAL_CELL; 4])], 40),
                Phase::new("persistent undervolt", vec![cells([360, 360, 280, 360])], 300),
                Phase::new("temperature priority", vec![Change::Temperature(90)], 60),
                Phase::new(
                    "temperature recovery",
                    vec![Change::Temperature(NOMINAL_TEMP)],
                    60,
                ),
                Phase::new("current fault", vec![Change::Current(220)], 120),
                Phase::new("current recovery", vec![Change::Current(NOMINAL_CURRENT)], 40),
                Phase::new(
                    "voltage masking",
                    vec![
                        Change::Mask(Channel::Voltage, true),
                        cells([360, 360, 270, 360]),
                    ],
                    200,
                ),
                Phase::new("manual reset", vec![Change::ManualReset(true)], 2),
                Phase::new("post reset", vec![Change::ManualReset(false)], 40),
            ],
        }
    }
}

//! The per-cycle step engine.
//!
//! One step runs the fixed pipeline, never reordered:
//!
//!   condition inputs -> condition pots -> condition switches
//!   -> clock 1 edges -> clock 2 edges -> user `on_step`
//!   -> change-filtered output flush
//!
//! So a hook always observes this cycle's freshly conditioned readings and
//! edge events, and outputs reflect exactly one hook invocation per cycle.
//! Everything is single-threaded and runs to completion; the only suspension
//! is an optional observation delay after a debug step.

mod config;
mod hooks;

pub use config::{
    ConfigError, HardwareMap, InputMode, ModuleConfig, OutputMode, MAX_ANALOG_OUTPUTS,
};
pub use hooks::ModuleHooks;

use tracing::debug;

use crate::clock::{ClockDetector, ClockEdge};
use crate::dac::{write_frame, DacChannel, DacFrame, DacPins};
use crate::hal::Board;
use crate::signal::{gate_from_raw, percent_from_raw, smoothed_mv, History};

/// Post-step delay when the debug flag is set, in ms.
const DEBUG_STEP_DELAY_MS: u32 = 250;

/// One conditioned input value, published for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputReading {
    /// Smoothed analog reading in mV.
    Millivolts(i32),
    /// Thresholded gate level.
    Gate(bool),
}

impl InputReading {
    /// The reading as millivolts; a gate reads as 0 or 1.
    pub fn mv(&self) -> i32 {
        match *self {
            InputReading::Millivolts(mv) => mv,
            InputReading::Gate(high) => i32::from(high),
        }
    }

    /// The reading as a level; an analog channel is high when non-zero.
    pub fn is_high(&self) -> bool {
        match *self {
            InputReading::Millivolts(mv) => mv != 0,
            InputReading::Gate(high) => high,
        }
    }
}

/// This cycle's published values, shared with hooks through [`StepCtx`].
#[derive(Debug, Default)]
struct StepValues {
    inputs: Vec<InputReading>,
    pots: Vec<u8>,
    switches: Vec<bool>,
    desired: Vec<i32>,
}

/// A hook's window onto the current cycle.
///
/// Channel indices out of range are a programming error and panic.
pub struct StepCtx<'a> {
    values: &'a mut StepValues,
}

impl StepCtx<'_> {
    /// Conditioned reading of input channel `index`.
    pub fn input(&self, index: usize) -> InputReading {
        self.values.inputs[index]
    }

    /// Pot channel `index`, 0-100%.
    pub fn pot(&self, index: usize) -> u8 {
        self.values.pots[index]
    }

    /// Switch channel `index`.
    pub fn switch(&self, index: usize) -> bool {
        self.values.switches[index]
    }

    /// Set output channel `index`'s desired value for this cycle.
    ///
    /// Analog channels interpret the value in DAC units (0-4095), digital
    /// channels as a boolean level. Takes effect at the end of the cycle,
    /// through the change filter.
    pub fn set_output(&mut self, index: usize, value: i32) {
        self.values.desired[index] = value;
    }
}

/// Resolved DAC routing for one analog output.
#[derive(Debug, Clone, Copy)]
struct DacRoute {
    pins: DacPins,
    channel: DacChannel,
}

/// The orchestrator: owns the board, the conditioned state, both clock
/// detectors, and the user's hook set.
pub struct Engine<B: Board, M: ModuleHooks> {
    board: B,
    hooks: M,
    map: HardwareMap,
    config: ModuleConfig,
    histories: Vec<History>,
    values: StepValues,
    /// Last value actually written per output; `None` until the first flush
    /// so an initial write always reaches hardware.
    committed: Vec<Option<i32>>,
    /// `None` entries are digital outputs.
    routes: Vec<Option<DacRoute>>,
    clock_1: ClockDetector,
    clock_2: ClockDetector,
}

impl<B: Board, M: ModuleHooks> Engine<B, M> {
    /// Validate the configuration and build the engine.
    ///
    /// Fails (rather than corrupting DAC addressing later) when more analog
    /// outputs are declared than the bus can route, when mode tables do not
    /// match the hardware map, or when a clock tracks a missing input.
    pub fn new(
        board: B,
        map: HardwareMap,
        config: ModuleConfig,
        hooks: M,
    ) -> Result<Self, ConfigError> {
        check_table("input", config.input_modes.len(), map.inputs.len())?;
        check_table("output", config.output_modes.len(), map.output_pins.len())?;
        check_clock(1, config.clock_source, map.inputs.len())?;
        check_clock(2, config.clock_source_2, map.inputs.len())?;
        if map.divider.is_some_and(|d| d.r2 == 0) {
            return Err(ConfigError::InvalidDivider);
        }

        let routes = resolve_dac_routes(&map, &config)?;

        let values = StepValues {
            inputs: vec![InputReading::Gate(false); map.inputs.len()],
            pots: vec![0; map.pots.len()],
            switches: vec![false; map.switches.len()],
            desired: vec![0; map.output_pins.len()],
        };

        Ok(Self {
            histories: vec![History::new(); map.inputs.len()],
            committed: vec![None; map.output_pins.len()],
            clock_1: config
                .clock_source
                .map_or_else(ClockDetector::disabled, ClockDetector::new),
            clock_2: config
                .clock_source_2
                .map_or_else(ClockDetector::disabled, ClockDetector::new),
            board,
            hooks,
            map,
            config,
            values,
            routes,
        })
    }

    /// Run the user's start hook. Call once before the first [`step`](Self::step).
    pub fn start(&mut self) {
        let Self { hooks, values, .. } = self;
        hooks.on_start(&mut StepCtx { values });
    }

    /// Run one full cycle.
    pub fn step(&mut self) {
        self.read_inputs();
        self.read_pots();
        self.read_switches();
        self.dispatch_clock(false);
        self.dispatch_clock(true);

        let Self { hooks, values, .. } = self;
        hooks.on_step(&mut StepCtx { values });

        self.write_outputs();

        if self.config.debug {
            self.board.delay_ms(DEBUG_STEP_DELAY_MS);
        }
    }

    fn read_inputs(&mut self) {
        for (i, &pin) in self.map.inputs.iter().enumerate() {
            let raw = self.board.read_adc(pin);
            self.values.inputs[i] = match self.config.input_modes[i] {
                InputMode::Analog => InputReading::Millivolts(smoothed_mv(
                    &mut self.histories[i],
                    raw,
                    self.map.divider,
                )),
                InputMode::Gate => InputReading::Gate(gate_from_raw(
                    raw,
                    self.config.gate_threshold_mv,
                    self.map.divider,
                )),
            };
        }
    }

    fn read_pots(&mut self) {
        for (i, &pin) in self.map.pots.iter().enumerate() {
            let raw = self.board.read_adc(pin);
            // pots sit directly on the ADC pin; the divider is jack-input wiring
            self.values.pots[i] = percent_from_raw(raw, &self.map.pot_curve, None);
        }
    }

    fn read_switches(&mut self) {
        for (i, &pin) in self.map.switches.iter().enumerate() {
            self.values.switches[i] = self.board.read_gpio(pin);
        }
    }

    fn dispatch_clock(&mut self, second: bool) {
        let detector = if second {
            &mut self.clock_2
        } else {
            &mut self.clock_1
        };
        let Some(source) = detector.source() else {
            return;
        };
        let level = self.values.inputs[source].is_high();
        let Some(edge) = detector.sample(level) else {
            return;
        };

        let Self { hooks, values, .. } = self;
        let mut ctx = StepCtx { values };
        match (second, edge) {
            (false, ClockEdge::Rise) => hooks.on_clock_rise(&mut ctx),
            (false, ClockEdge::Fall) => hooks.on_clock_fall(&mut ctx),
            (true, ClockEdge::Rise) => hooks.on_clock_rise_2(&mut ctx),
            (true, ClockEdge::Fall) => hooks.on_clock_fall_2(&mut ctx),
        }
    }

    /// Flush desired values, skipping channels whose committed value is
    /// unchanged. Idle cycles collapse to a no-op and the DAC bus sees no
    /// chip-select churn.
    fn write_outputs(&mut self) {
        for i in 0..self.values.desired.len() {
            let desired = self.values.desired[i];
            if self.committed[i] != Some(desired) {
                match self.routes[i] {
                    Some(route) => {
                        debug!(output = i, desired, "committing analog output");
                        let frame = DacFrame::encode(desired, route.channel);
                        write_frame(&mut self.board, &route.pins, frame);
                    }
                    None => {
                        debug!(output = i, desired, "committing digital output");
                        if let Some(pin) = self.map.output_pins[i] {
                            self.board.write_gpio(pin, desired != 0);
                        }
                    }
                }
            }
            self.committed[i] = Some(desired);
        }
    }

    /// Conditioned reading of input channel `index` for the current cycle.
    pub fn input(&self, index: usize) -> InputReading {
        self.values.inputs[index]
    }

    /// Pot channel `index`, 0-100%.
    pub fn pot(&self, index: usize) -> u8 {
        self.values.pots[index]
    }

    /// Switch channel `index`.
    pub fn switch(&self, index: usize) -> bool {
        self.values.switches[index]
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub fn hooks(&self) -> &M {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut M {
        &mut self.hooks
    }
}

fn check_table(what: &'static str, got: usize, expected: usize) -> Result<(), ConfigError> {
    if got != expected {
        return Err(ConfigError::ModeTableMismatch {
            what,
            got,
            expected,
        });
    }
    Ok(())
}

fn check_clock(clock: u8, source: Option<usize>, inputs: usize) -> Result<(), ConfigError> {
    match source {
        Some(s) if s >= inputs => Err(ConfigError::ClockSourceOutOfRange {
            clock,
            input: s,
            inputs,
        }),
        _ => Ok(()),
    }
}

/// Assign analog outputs to DAC chips and channels in declaration order:
/// the first two land on chip A (channels A then B), the next two on chip B.
fn resolve_dac_routes(
    map: &HardwareMap,
    config: &ModuleConfig,
) -> Result<Vec<Option<DacRoute>>, ConfigError> {
    let declared = config
        .output_modes
        .iter()
        .filter(|&&m| m == OutputMode::Analog)
        .count();
    if declared > MAX_ANALOG_OUTPUTS {
        return Err(ConfigError::TooManyAnalogOutputs { declared });
    }

    let mut routes = Vec::with_capacity(config.output_modes.len());
    let mut slot = 0usize;
    for (index, &mode) in config.output_modes.iter().enumerate() {
        match mode {
            OutputMode::Analog => {
                let (chip, pins) = if slot < 2 {
                    ('A', map.dac_a)
                } else {
                    ('B', map.dac_b)
                };
                let pins = pins.ok_or(ConfigError::MissingDacPins { index, chip })?;
                let channel = if slot % 2 == 0 {
                    DacChannel::A
                } else {
                    DacChannel::B
                };
                routes.push(Some(DacRoute { pins, channel }));
                slot += 1;
            }
            OutputMode::Digital => {
                if map.output_pins[index].is_none() {
                    return Err(ConfigError::MissingOutputPin { index });
                }
                routes.push(None);
            }
        }
    }
    Ok(routes)
}

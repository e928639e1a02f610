//! Immutable configuration for one module.
//!
//! Everything here is fixed before the run loop starts: the hardware map
//! describes what is physically wired where, the module config describes how
//! this particular program wants each channel treated. Validation happens
//! once, in [`Engine::new`](super::Engine::new) — a bad configuration must
//! never reach the step loop.

use thiserror::Error;

use crate::dac::DacPins;
use crate::hal::Pin;
use crate::signal::{PotCurve, VoltageDivider};

/// Analog outputs the DAC bus can carry: two dual-channel chips.
pub const MAX_ANALOG_OUTPUTS: usize = 4;

/// Configuration problems caught before the run loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{declared} analog outputs declared, the bus carries at most {MAX_ANALOG_OUTPUTS}")]
    TooManyAnalogOutputs { declared: usize },

    #[error("{what} mode table has {got} entries, hardware map has {expected}")]
    ModeTableMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    // the field is `input`, not `source`: thiserror reserves that name for
    // the error chain
    #[error("clock {clock} reads input {input}, but only {inputs} inputs are mapped")]
    ClockSourceOutOfRange {
        clock: u8,
        input: usize,
        inputs: usize,
    },

    #[error("analog output {index} needs DAC chip {chip} pins, which are not mapped")]
    MissingDacPins { index: usize, chip: char },

    #[error("digital output {index} has no pin mapped")]
    MissingOutputPin { index: usize },

    #[error("input voltage divider has r2 = 0, the jack voltage cannot be back-calculated")]
    InvalidDivider,
}

/// Fixed wiring of one physical module.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardwareMap {
    /// Jack input pins, index order defines input channel numbering.
    pub inputs: Vec<Pin>,
    /// Pot pins.
    pub pots: Vec<Pin>,
    /// Switch pins.
    pub switches: Vec<Pin>,
    /// Digital output pins; `None` for channels routed to the DAC bus.
    pub output_pins: Vec<Option<Pin>>,
    /// First dual-channel DAC chip, if wired.
    pub dac_a: Option<DacPins>,
    /// Second chip.
    pub dac_b: Option<DacPins>,
    /// Input voltage divider shared by all jack inputs.
    pub divider: Option<VoltageDivider>,
    /// Pot travel curve.
    pub pot_curve: PotCurve,
}

/// How an input channel is conditioned each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputMode {
    /// Smoothed millivolt reading.
    Analog,
    /// Threshold-compared gate. The default.
    #[default]
    Gate,
}

/// Where an output channel's value goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputMode {
    /// DAC bus, value in DAC units.
    Analog,
    /// GPIO level, value treated as a boolean.
    #[default]
    Digital,
}

/// Per-program channel configuration, built once at startup.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleConfig {
    pub input_modes: Vec<InputMode>,
    pub output_modes: Vec<OutputMode>,
    /// Gate conditioning threshold in mV.
    pub gate_threshold_mv: i32,
    /// Input channel clock 1 tracks; `None` = no clock present.
    pub clock_source: Option<usize>,
    /// Input channel clock 2 tracks.
    pub clock_source_2: Option<usize>,
    /// Slow the loop down after each step for human observation.
    pub debug: bool,
}

impl ModuleConfig {
    /// Config for a module with the given channel counts: all inputs gates,
    /// all outputs digital, no clocks, 500 mV threshold.
    pub fn new(inputs: usize, outputs: usize) -> Self {
        Self {
            input_modes: vec![InputMode::default(); inputs],
            output_modes: vec![OutputMode::default(); outputs],
            gate_threshold_mv: 500,
            clock_source: None,
            clock_source_2: None,
            debug: false,
        }
    }

    pub fn set_input_analog(mut self, index: usize) -> Self {
        self.input_modes[index] = InputMode::Analog;
        self
    }

    pub fn set_output_analog(mut self, index: usize) -> Self {
        self.output_modes[index] = OutputMode::Analog;
        self
    }

    /// Treat an input channel as clock 1.
    pub fn enable_clock(mut self, source: usize) -> Self {
        self.clock_source = Some(source);
        self
    }

    /// Treat an input channel as clock 2.
    pub fn enable_clock_2(mut self, source: usize) -> Self {
        self.clock_source_2 = Some(source);
        self
    }

    pub fn set_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_hardware_conventions() {
        let config = ModuleConfig::new(2, 2);
        assert_eq!(config.input_modes, vec![InputMode::Gate; 2]);
        assert_eq!(config.output_modes, vec![OutputMode::Digital; 2]);
        assert_eq!(config.gate_threshold_mv, 500);
        assert_eq!(config.clock_source, None);
        assert!(!config.debug);
    }

    #[test]
    fn builder_toggles_compose() {
        let config = ModuleConfig::new(2, 2)
            .set_input_analog(1)
            .set_output_analog(0)
            .enable_clock(0)
            .set_debug(true);
        assert_eq!(config.input_modes[1], InputMode::Analog);
        assert_eq!(config.output_modes[0], OutputMode::Analog);
        assert_eq!(config.clock_source, Some(0));
        assert!(config.debug);
    }
}

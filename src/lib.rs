pub mod clock;
pub mod dac;
pub mod engine;
pub mod hal;
pub mod playback; // Sample transport layered on the step engine
pub mod quantize;
pub mod signal; // Input conditioning (mV, gates, pot percentages)

/// Millivolts spanned by one octave of control voltage (1 V/oct).
pub const MV_PER_OCTAVE: i32 = 1000;
pub(crate) const DAC_MAX_CODE: i32 = 4095;

//! Scriptable board for host-side tests and the simulator binary.

use std::collections::HashMap;

use super::{Board, Pin};

/// One recorded GPIO write, in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioEvent {
    pub pin: Pin,
    pub high: bool,
}

/// In-memory [`Board`]: ADC and GPIO input levels are set by the test,
/// every GPIO write is recorded, and time advances only through delays
/// (plus a fixed tick per read so pollers always see time moving).
#[derive(Debug, Default)]
pub struct SimBoard {
    adc: HashMap<Pin, u16>,
    gpio_in: HashMap<Pin, bool>,
    gpio_out: HashMap<Pin, bool>,
    writes: Vec<GpioEvent>,
    clock_us: u64,
}

impl SimBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the raw ADC counts returned for `pin`.
    pub fn set_adc(&mut self, pin: Pin, raw: u16) {
        self.adc.insert(pin, raw);
    }

    /// Script the ADC so that conditioning yields roughly `mv` millivolts
    /// (no divider). Saturates at the 10-bit ceiling.
    pub fn set_adc_mv(&mut self, pin: Pin, mv: i32) {
        let raw = (mv.max(0) as f32 / crate::signal::MV_PER_COUNT) as u16;
        self.set_adc(pin, raw.min(1023));
    }

    /// Script a digital input level.
    pub fn set_gpio(&mut self, pin: Pin, high: bool) {
        self.gpio_in.insert(pin, high);
    }

    /// Last level driven onto an output pin, if any write happened.
    pub fn output_level(&self, pin: Pin) -> Option<bool> {
        self.gpio_out.get(&pin).copied()
    }

    /// Every GPIO write issued so far, oldest first.
    pub fn writes(&self) -> &[GpioEvent] {
        &self.writes
    }

    /// Writes issued to one pin only.
    pub fn writes_to(&self, pin: Pin) -> Vec<bool> {
        self.writes
            .iter()
            .filter(|e| e.pin == pin)
            .map(|e| e.high)
            .collect()
    }

    /// Forget the write log (levels persist).
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl Board for SimBoard {
    fn read_adc(&mut self, pin: Pin) -> u16 {
        self.clock_us += 1;
        self.adc.get(&pin).copied().unwrap_or(0)
    }

    fn read_gpio(&mut self, pin: Pin) -> bool {
        self.clock_us += 1;
        self.gpio_in.get(&pin).copied().unwrap_or(false)
    }

    fn write_gpio(&mut self, pin: Pin, high: bool) {
        self.gpio_out.insert(pin, high);
        self.writes.push(GpioEvent { pin, high });
    }

    fn delay_us(&mut self, us: u32) {
        self.clock_us += u64::from(us);
    }

    fn now_micros(&mut self) -> u64 {
        self.clock_us
    }
}

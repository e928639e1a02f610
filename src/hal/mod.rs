//! Hardware abstraction seam between the step engine and physical I/O.
//!
//! The engine never touches registers directly; everything goes through the
//! [`Board`] trait so the same core runs on real hardware or on the
//! [`SimBoard`] simulator during host tests.

mod sim;

pub use sim::{GpioEvent, SimBoard};

/// A physical pin number, analog or digital.
///
/// Pins are opaque to the core: the [`Board`] implementation decides what a
/// number means (Arduino-style analog indices, port/pin packing, whatever).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pin(pub u8);

/// Everything the cycle engine needs from the hardware.
pub trait Board {
    /// Sample an analog pin. Raw ADC counts, 10-bit range assumed.
    fn read_adc(&mut self, pin: Pin) -> u16;

    /// Read a digital pin level.
    fn read_gpio(&mut self, pin: Pin) -> bool;

    /// Drive a digital pin level.
    fn write_gpio(&mut self, pin: Pin, high: bool);

    /// Busy-wait for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Busy-wait for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1_000));
    }

    /// Monotonic microsecond counter since boot.
    fn now_micros(&mut self) -> u64;
}

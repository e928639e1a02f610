//! MCP4822-style dual DAC: frame encoding and bit-banged transfer.
//!
//! The chip takes a 16-bit command word per write:
//!
//!   bit 15  channel select (0 = A, 1 = B)      transmitted first
//!   bit 14  unused (buffer control, left 0)
//!   bit 13  ~GA gain select, INVERTED: 0 = 2x output range, 1 = 1x
//!   bit 12  ~SHDN, 1 = output active
//!   11..0   data code, MSB first on the wire
//!
//! Codes above half scale ship as-is with the 2x stage enabled; codes at or
//! below half scale ship doubled with the 2x stage off, which keeps full
//! 12-bit resolution across the lower half of the range. Bit polarity and
//! strobe order come from the chip datasheet, not from taste — verify against
//! the datasheet before porting this to another vendor's part.

use tracing::trace;

use crate::hal::{Board, Pin};
use crate::DAC_MAX_CODE;

/// Which of the chip's two outputs a frame addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DacChannel {
    A,
    B,
}

/// Pin group wiring one DAC chip to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DacPins {
    pub cs: Pin,
    pub sck: Pin,
    pub sdi: Pin,
    /// Load strobe; `None` when the LDAC line is tied low in hardware.
    pub ldac: Option<Pin>,
}

/// One encoded 16-bit command word. Ephemeral, rebuilt per write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DacFrame(u16);

impl DacFrame {
    /// Encode a voltage code (DAC units, clamped to 0..=4095) for `channel`.
    pub fn encode(code: i32, channel: DacChannel) -> Self {
        let v = code.clamp(0, DAC_MAX_CODE) as u16;

        // Above half scale the 2x stage carries the range; below it, doubling
        // the code preserves resolution. 2048 doubled would need a 13th bit,
        // so it saturates.
        let (gain_doubled, data) = if v > 2048 {
            (true, v)
        } else {
            (false, (v * 2).min(DAC_MAX_CODE as u16))
        };

        let mut word = data & 0x0fff;
        word |= 1 << 12; // ~SHDN: output active
        if !gain_doubled {
            word |= 1 << 13; // ~GA high = 1x
        }
        if channel == DacChannel::B {
            word |= 1 << 15;
        }
        Self(word)
    }

    /// The 12-bit code as it will appear on the wire.
    pub fn payload(&self) -> u16 {
        self.0 & 0x0fff
    }

    /// True when the frame engages the chip's 2x output stage.
    pub fn gain_doubled(&self) -> bool {
        self.0 & (1 << 13) == 0
    }

    pub fn channel(&self) -> DacChannel {
        if self.0 & (1 << 15) == 0 {
            DacChannel::A
        } else {
            DacChannel::B
        }
    }

    /// Full command word.
    pub fn word(&self) -> u16 {
        self.0
    }

    /// Frame bits in transmission order (MSB first).
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..16).rev().map(move |i| self.0 & (1 << i) != 0)
    }
}

/// Clock a frame out to one chip.
///
/// Chip select drops, 16 bits go out data-before-clock-pulse, chip select
/// rises, the load strobe latches the output if wired, and chip select is
/// held high for 1 us so a back-to-back write to the other chip on the
/// shared bus cannot disturb this one's latch timing.
pub fn write_frame<B: Board>(board: &mut B, pins: &DacPins, frame: DacFrame) {
    trace!(word = frame.word(), "dac write");

    board.write_gpio(pins.cs, false);
    for bit in frame.bits() {
        board.write_gpio(pins.sdi, bit);
        board.write_gpio(pins.sck, true);
        board.write_gpio(pins.sck, false);
    }
    board.write_gpio(pins.cs, true);

    if let Some(ldac) = pins.ldac {
        board.write_gpio(ldac, false);
        board.write_gpio(ldac, true);
    }

    board.delay_us(1); // CS hold between chips sharing the bus
}

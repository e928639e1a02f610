//! rackstep-sim - host simulator for the step engine
//!
//! Runs a quantizing sample-and-hold module against a scripted board: a
//! square-wave clock on input 0, a rising control voltage on input 1, and a
//! pot choosing how hard the quantizer works. Every committed DAC frame ends
//! up in the SimBoard write log, which we decode and print at the end.
//!
//! Run with: cargo run --bin rackstep-sim

use rackstep::dac::DacPins;
use rackstep::engine::{Engine, HardwareMap, ModuleConfig, ModuleHooks, StepCtx};
use rackstep::hal::{GpioEvent, Pin, SimBoard};
use rackstep::quantize::{quantize_mv, Scale};
use rackstep::signal::PotCurve;

const CLOCK_IN: Pin = Pin(0);
const CV_IN: Pin = Pin(1);
const POT: Pin = Pin(2);

const DAC: DacPins = DacPins {
    cs: Pin(4),
    sck: Pin(5),
    sdi: Pin(6),
    ldac: Some(Pin(7)),
};

/// Sample the CV on every clock rise, quantize it to C major, hold it on the
/// analog output until the next rise.
struct QuantizingSampleHold {
    scale: Scale,
    held_mv: i32,
}

impl QuantizingSampleHold {
    fn new() -> Self {
        Self {
            scale: Scale::major(),
            held_mv: 0,
        }
    }
}

impl ModuleHooks for QuantizingSampleHold {
    fn on_clock_rise(&mut self, ctx: &mut StepCtx) {
        let cv = ctx.input(1).mv();
        self.held_mv = quantize_mv(cv, &self.scale);
        ctx.set_output(0, self.held_mv);
        tracing::info!(cv, held = self.held_mv, "sampled");
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt().init();

    let map = HardwareMap {
        inputs: vec![CLOCK_IN, CV_IN],
        pots: vec![POT],
        switches: vec![],
        output_pins: vec![None],
        dac_a: Some(DAC),
        dac_b: None,
        divider: None,
        pot_curve: PotCurve::new(5000),
    };
    let config = ModuleConfig::new(2, 1)
        .set_input_analog(1)
        .set_output_analog(0)
        .enable_clock(0);

    let mut engine = Engine::new(SimBoard::new(), map, config, QuantizingSampleHold::new())?;
    engine.start();

    // 64 cycles: clock toggles every 4, CV ramps 0 -> ~3 V
    for cycle in 0..64u32 {
        let clock_high = (cycle / 4) % 2 == 1;
        engine
            .board_mut()
            .set_adc_mv(CLOCK_IN, if clock_high { 3000 } else { 0 });
        engine.board_mut().set_adc_mv(CV_IN, (cycle * 50) as i32);
        engine.board_mut().set_adc(POT, 512);
        engine.step();
    }

    let frames = decode_frames(engine.board().writes(), &DAC);
    println!("committed {} DAC frames:", frames.len());
    for word in frames {
        println!(
            "  {:#06x}  payload {:4}  gain {}",
            word,
            word & 0x0fff,
            if word & (1 << 13) == 0 { "2x" } else { "1x" }
        );
    }

    Ok(())
}

/// SDI sampled at each SCK rising edge while CS is low.
fn decode_frames(writes: &[GpioEvent], pins: &DacPins) -> Vec<u16> {
    let mut frames = Vec::new();
    let mut cs_low = false;
    let mut sdi = false;
    let mut word = 0u16;
    for event in writes {
        if event.pin == pins.cs {
            if event.high && cs_low {
                frames.push(word);
            }
            cs_low = !event.high;
            word = 0;
        } else if event.pin == pins.sdi {
            sdi = event.high;
        } else if event.pin == pins.sck && event.high && cs_low {
            word = (word << 1) | u16::from(sdi);
        }
    }
    frames
}

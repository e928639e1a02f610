//! Input conditioning: raw ADC counts to calibrated readings.
//!
//! Four conditioning modes, matching what a control-voltage front end needs:
//!
//!   millivolts   back-calculate the jack voltage, optionally through a
//!                voltage divider
//!   smoothed     millivolts averaged over the channel's last 8 samples
//!   gate         millivolts compared against a threshold
//!   percent      pot position as 0-100% of a maximum voltage, floored to a
//!                tolerance step to hide ADC jitter
//!
//! All functions are pure except for the history ring a smoothed channel
//! owns.

use tracing::trace;

/// Millivolts per ADC count: 10-bit converter against a 5 V reference.
pub const MV_PER_COUNT: f32 = 4.9;

/// Samples kept per input channel for smoothing.
pub const HISTORY_LEN: usize = 8;

/// Resistor pair of an input voltage divider, in ohms.
///
/// `r1` sits between the jack and the ADC pin, `r2` between the pin and
/// ground. Channels wired straight to the pin use `None` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoltageDivider {
    pub r1: u32,
    pub r2: u32,
}

/// Convert raw ADC counts to millivolts at the jack.
///
/// With a divider the pre-divider voltage is reconstructed by scaling with
/// `(r1 + r2) / r2`.
pub fn raw_to_mv(raw: u16, divider: Option<VoltageDivider>) -> i32 {
    let direct = f32::from(raw) * MV_PER_COUNT;
    let mv = match divider {
        Some(d) => direct * (d.r1 + d.r2) as f32 / d.r2 as f32,
        None => direct,
    };
    mv as i32
}

/// Compare a conditioned reading against a gate threshold.
pub fn gate_from_raw(raw: u16, threshold_mv: i32, divider: Option<VoltageDivider>) -> bool {
    raw_to_mv(raw, divider) > threshold_mv
}

/// How a pot's travel maps onto 0-100%.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PotCurve {
    /// Voltage at full travel, in mV.
    pub max_mv: i32,
    /// Invert the reading (pots wired with travel opposite the panel label).
    pub reverse: bool,
    /// Floor the percentage to a multiple of this step. Zero disables.
    pub tolerance: u8,
}

impl PotCurve {
    pub fn new(max_mv: i32) -> Self {
        Self {
            max_mv,
            reverse: false,
            tolerance: 4,
        }
    }
}

/// Convert raw ADC counts to a pot percentage through `curve`.
pub fn percent_from_raw(raw: u16, curve: &PotCurve, divider: Option<VoltageDivider>) -> u8 {
    let mv = raw_to_mv(raw, divider);
    let mut pct = (100 * mv.max(0) / curve.max_mv.max(1)).min(100) as u8;
    if curve.tolerance > 0 {
        pct = pct / curve.tolerance * curve.tolerance;
    }
    if curve.reverse {
        pct = 100 - pct;
    }
    trace!(raw, pct, "conditioned pot");
    pct
}

/// Fixed 8-slot sample history for one input channel.
///
/// A write cursor replaces the usual shift-everything-left update; the ring
/// always holds exactly [`HISTORY_LEN`] entries (zeros until warmed up) and
/// the average is always over the full window.
#[derive(Debug, Clone, Default)]
pub struct History {
    samples: [i32; HISTORY_LEN],
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reading, evicting the oldest.
    pub fn push(&mut self, mv: i32) {
        self.samples[self.cursor] = mv;
        self.cursor = (self.cursor + 1) % HISTORY_LEN;
    }

    /// Integer mean over the full window.
    pub fn average(&self) -> i32 {
        let sum: i64 = self.samples.iter().map(|&s| i64::from(s)).sum();
        (sum / HISTORY_LEN as i64) as i32
    }
}

/// Condition a raw sample into a smoothed millivolt reading, updating the
/// channel's history.
pub fn smoothed_mv(history: &mut History, raw: u16, divider: Option<VoltageDivider>) -> i32 {
    history.push(raw_to_mv(raw, divider));
    let mv = history.average();
    trace!(raw, mv, "conditioned input");
    mv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_conversion_uses_fixed_factor() {
        assert_eq!(raw_to_mv(0, None), 0);
        assert_eq!(raw_to_mv(100, None), 490);
        assert_eq!(raw_to_mv(1023, None), 5012);
    }

    #[test]
    fn divider_back_calculates_jack_voltage() {
        let divider = Some(VoltageDivider { r1: 220, r2: 150 });
        // 100 counts = 490 mV at the pin, * 370/150 at the jack
        assert_eq!(raw_to_mv(100, divider), 1208);
    }

    #[test]
    fn gate_compares_against_threshold() {
        assert!(gate_from_raw(200, 500, None)); // 980 mV
        assert!(!gate_from_raw(100, 500, None)); // 490 mV
        assert!(!gate_from_raw(0, 500, None));
    }

    #[test]
    fn average_covers_exactly_the_last_eight() {
        let mut history = History::new();
        for mv in [8, 8, 8, 8, 8, 8, 8, 8] {
            history.push(mv);
        }
        assert_eq!(history.average(), 8);

        // pushing one more evicts the oldest, not the newest
        history.push(16);
        assert_eq!(history.average(), 9);
    }

    #[test]
    fn smoothed_reading_is_integer_mean_of_window() {
        let mut history = History::new();
        let mut last = 0;
        for _ in 0..HISTORY_LEN {
            last = smoothed_mv(&mut history, 100, None);
        }
        // all 8 slots now hold 490 mV
        assert_eq!(last, 490);
    }

    #[test]
    fn cold_history_dilutes_first_sample() {
        let mut history = History::new();
        // 7 zero slots remain, so a single sample is averaged down 8x
        let mv = smoothed_mv(&mut history, 163, None); // 798 mV
        assert_eq!(mv, 798 / 8);
    }

    #[test]
    fn percent_clamps_and_floors_to_tolerance() {
        let curve = PotCurve::new(5000);
        assert_eq!(percent_from_raw(0, &curve, None), 0);
        // 510 counts = 2499 mV = 49.9% -> 49 -> floored to 48
        assert_eq!(percent_from_raw(510, &curve, None), 48);
        // past full travel clamps to 100
        assert_eq!(percent_from_raw(1023, &curve, None), 100);
    }

    #[test]
    fn percent_reverse_inverts() {
        let curve = PotCurve {
            max_mv: 5000,
            reverse: true,
            tolerance: 4,
        };
        assert_eq!(percent_from_raw(0, &curve, None), 100);
        assert_eq!(percent_from_raw(1023, &curve, None), 0);
    }
}

//! Voltage quantizer: snap a control voltage to the nearest enabled tone.
//!
//! Quantizers force smoothly changing voltages onto discrete note values so
//! the musician stays in tune. The octave follows the 1 V/oct convention:
//! 1000 mV per octave, 12 equal semitones of 83.33 mV each.
//!
//! The search starts from the two tones bracketing the input and widens one
//! semitone per side per iteration; whenever a side walks off the octave it
//! wraps and books a +/-1 octave shift for that side. With any tone enabled
//! it terminates within 6 iterations (half the octave); with none enabled it
//! returns the input untouched rather than looping forever.

use crate::MV_PER_OCTAVE;

/// Tones in one octave.
pub const TONES_PER_OCTAVE: usize = 12;

/// Millivolts per semitone.
pub const MV_PER_TONE: f32 = MV_PER_OCTAVE as f32 / TONES_PER_OCTAVE as f32;

/// Which of the 12 semitones a quantized voltage may land on.
///
/// Index 0 is the octave root (C in note terms), index 11 the major seventh
/// (B). The quantizer never mutates a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scale([bool; TONES_PER_OCTAVE]);

impl Scale {
    /// Scale with no tones enabled. Quantizing against it is a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    /// All 12 semitones enabled.
    pub fn chromatic() -> Self {
        Self([true; TONES_PER_OCTAVE])
    }

    /// Scale from a list of enabled semitone indices.
    pub fn from_tones(tones: &[usize]) -> Self {
        let mut scale = Self::default();
        for &tone in tones {
            scale.0[tone] = true;
        }
        scale
    }

    /// Major scale degrees (whole-whole-half pattern from the root).
    pub fn major() -> Self {
        Self::from_tones(&[0, 2, 4, 5, 7, 9, 11])
    }

    /// Natural minor scale degrees.
    pub fn minor() -> Self {
        Self::from_tones(&[0, 2, 3, 5, 7, 8, 10])
    }

    pub fn set(&mut self, tone: usize, enabled: bool) {
        self.0[tone] = enabled;
    }

    pub fn is_enabled(&self, tone: usize) -> bool {
        self.0[tone]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&t| t)
    }
}

/// Outcome of one quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantized {
    /// Chosen semitone, 0..=11.
    pub tone: usize,
    /// Octaves the search crossed to reach it (-1, 0 or +1).
    pub octave_shift: i32,
    /// Reconstructed output voltage in mV.
    pub mv: i32,
}

/// Snap `mv` to the nearest voltage whose sub-octave position is an enabled
/// tone of `scale`. Returns `None` for an empty scale.
pub fn quantize(mv: i32, scale: &Scale) -> Option<Quantized> {
    if scale.is_empty() {
        return None;
    }

    // Euclidean split keeps the remainder in [0, 1000) even below 0 V.
    let octave = mv.div_euclid(MV_PER_OCTAVE);
    let resid_mv = mv.rem_euclid(MV_PER_OCTAVE);
    let resid_tones = resid_mv as f32 / MV_PER_TONE;

    let mut floor_tone = resid_tones.floor() as usize;
    let mut ceil_tone = floor_tone + 1;
    let mut shift_floor = 0;
    let mut shift_ceil = 0;
    if ceil_tone == TONES_PER_OCTAVE {
        // bracketing from the topmost semitone: the ceiling is next octave's
        // root, not a 13th tone
        ceil_tone = 0;
        shift_ceil = 1;
    }

    let (tone, octave_shift) = loop {
        let floor_on = scale.is_enabled(floor_tone);
        let ceil_on = scale.is_enabled(ceil_tone);

        match (floor_on, ceil_on) {
            (true, false) => break (floor_tone, shift_floor),
            (false, true) => break (ceil_tone, shift_ceil),
            (true, true) => {
                // both enabled: take the closer, ties to the floor tone
                let frac = resid_tones - resid_tones.floor();
                if frac <= 0.5 {
                    break (floor_tone, shift_floor);
                }
                break (ceil_tone, shift_ceil);
            }
            (false, false) => {
                if floor_tone == 0 {
                    floor_tone = TONES_PER_OCTAVE - 1;
                    shift_floor -= 1;
                } else {
                    floor_tone -= 1;
                }
                if ceil_tone == TONES_PER_OCTAVE - 1 {
                    ceil_tone = 0;
                    shift_ceil += 1;
                } else {
                    ceil_tone += 1;
                }
            }
        }
    };

    let mv = (octave + octave_shift) * MV_PER_OCTAVE + (tone as f32 * MV_PER_TONE) as i32;
    Some(Quantized {
        tone,
        octave_shift,
        mv,
    })
}

/// Quantize, passing the input through unchanged when the scale is empty.
pub fn quantize_mv(mv: i32, scale: &Scale) -> i32 {
    match quantize(mv, scale) {
        Some(q) => q.mv,
        None => mv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scale_passes_input_through() {
        let scale = Scale::empty();
        for mv in [-250, 0, 450, 999, 1000, 3721] {
            assert_eq!(quantize_mv(mv, &scale), mv);
            assert_eq!(quantize(mv, &scale), None);
        }
    }

    #[test]
    fn chromatic_scale_rounds_to_nearest_semitone() {
        let scale = Scale::chromatic();
        // 450 mV sits at tone 5.4 -> floor tone 5 at 416 mV
        let q = quantize(450, &scale).unwrap();
        assert_eq!(q.tone, 5);
        assert_eq!(q.octave_shift, 0);
        assert_eq!(q.mv, 416);

        // 460 mV sits at tone 5.52 -> ceil tone 6 at 500 mV
        let q = quantize(460, &scale).unwrap();
        assert_eq!(q.tone, 6);
        assert_eq!(q.mv, 500);
    }

    #[test]
    fn root_only_scale_wraps_to_nearest_root() {
        let scale = Scale::from_tones(&[0]);

        // 450 mV: floor side reaches tone 0 one iteration before the ceil
        // side wraps, so the root of the same octave wins
        let q = quantize(450, &scale).unwrap();
        assert_eq!(q.tone, 0);
        assert_eq!(q.octave_shift, 0);
        assert_eq!(q.mv, 0);

        // 900 mV: the ceil side wraps to next octave's root first
        let q = quantize(900, &scale).unwrap();
        assert_eq!(q.tone, 0);
        assert_eq!(q.octave_shift, 1);
        assert_eq!(q.mv, 1000);
    }

    #[test]
    fn octave_component_is_preserved() {
        let scale = Scale::from_tones(&[0]);
        assert_eq!(quantize_mv(2450, &scale), 2000);
        assert_eq!(quantize_mv(3900, &scale), 4000);
    }

    #[test]
    fn downward_wrap_books_negative_shift() {
        // only the major seventh enabled: anything near the octave bottom
        // must wrap down
        let scale = Scale::from_tones(&[11]);
        let q = quantize(1010, &scale).unwrap();
        assert_eq!(q.tone, 11);
        assert_eq!(q.octave_shift, -1);
        assert_eq!(q.mv, 916); // 0 * 1000 + 11 * 83.33
    }

    #[test]
    fn tie_between_enabled_neighbors_takes_floor() {
        let scale = Scale::chromatic();
        // exactly halfway between tones 2 and 3 (2.5 * 83.333 = 208.33)
        let halfway = (2.5 * MV_PER_TONE) as i32; // 208 -> frac just under .5
        let q = quantize(halfway, &scale).unwrap();
        assert_eq!(q.tone, 2);
    }

    #[test]
    fn closer_enabled_neighbor_wins() {
        let scale = Scale::from_tones(&[2, 3]);
        let near_two = (2.2 * MV_PER_TONE) as i32;
        assert_eq!(quantize(near_two, &scale).unwrap().tone, 2);
        let near_three = (2.8 * MV_PER_TONE) as i32;
        assert_eq!(quantize(near_three, &scale).unwrap().tone, 3);
    }

    #[test]
    fn major_scale_rejects_non_diatonic_tones() {
        let scale = Scale::major();
        // tone 6 (F#) is not in C major; 6.0 exactly -> neighbors 6,7 -> 7
        let fs = (6.0 * MV_PER_TONE) as i32 + 1;
        let q = quantize(fs, &scale).unwrap();
        assert!(scale.is_enabled(q.tone));
    }

    #[test]
    fn terminates_for_every_single_tone_scale() {
        // worst case: one enabled tone, input at the far side of the octave
        for tone in 0..TONES_PER_OCTAVE {
            let scale = Scale::from_tones(&[tone]);
            for mv in (0..2000).step_by(37) {
                let q = quantize(mv, &scale).unwrap();
                assert_eq!(q.tone, tone);
                assert!((-1..=1).contains(&q.octave_shift));
            }
        }
    }

    #[test]
    fn negative_voltages_split_cleanly() {
        let scale = Scale::chromatic();
        // -50 mV is tone 11.4 of octave -1
        let q = quantize(-50, &scale).unwrap();
        assert_eq!(q.tone, 11);
        assert_eq!(q.mv, -1000 + 916);
    }
}

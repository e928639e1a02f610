//! Clock edge detection.
//!
//! A module can track up to two unrelated clock signals; each gets its own
//! [`ClockDetector`] so their states never interact. The detector is a
//! two-state machine that reports each physical transition exactly once: a
//! steady level can never re-fire, and a detector without a source channel
//! never fires at all (the "no clock present" default).

use tracing::debug;

/// A reported clock transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEdge {
    Rise,
    Fall,
}

/// Which transition the detector is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    AwaitingRise,
    AwaitingFall,
}

/// Edge-triggered state machine for one clock signal.
#[derive(Debug, Clone)]
pub struct ClockDetector {
    source: Option<usize>,
    state: EdgeState,
}

impl ClockDetector {
    /// Detector tracking input channel `source`. Starts low: the first high
    /// level observed is a rise.
    pub fn new(source: usize) -> Self {
        Self {
            source: Some(source),
            state: EdgeState::AwaitingRise,
        }
    }

    /// Detector with no source assigned; [`sample`](Self::sample) never
    /// reports an edge.
    pub fn disabled() -> Self {
        Self {
            source: None,
            state: EdgeState::AwaitingRise,
        }
    }

    /// The input channel this detector reads, if any.
    pub fn source(&self) -> Option<usize> {
        self.source
    }

    /// Feed the current level of the source channel.
    ///
    /// Returns the edge this level completes, or `None` while the level is
    /// steady or the detector is disabled.
    pub fn sample(&mut self, level: bool) -> Option<ClockEdge> {
        self.source?;

        match (self.state, level) {
            (EdgeState::AwaitingRise, true) => {
                self.state = EdgeState::AwaitingFall;
                debug!(source = self.source, "clock rise");
                Some(ClockEdge::Rise)
            }
            (EdgeState::AwaitingFall, false) => {
                self.state = EdgeState::AwaitingRise;
                debug!(source = self.source, "clock fall");
                Some(ClockEdge::Fall)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(detector: &mut ClockDetector, levels: &[bool]) -> Vec<Option<ClockEdge>> {
        levels.iter().map(|&l| detector.sample(l)).collect()
    }

    #[test]
    fn fires_once_per_transition() {
        let mut detector = ClockDetector::new(0);
        let seen = edges(&mut detector, &[false, false, true, true, false]);
        assert_eq!(
            seen,
            vec![None, None, Some(ClockEdge::Rise), None, Some(ClockEdge::Fall)]
        );
    }

    #[test]
    fn steady_high_cannot_refire() {
        let mut detector = ClockDetector::new(0);
        assert_eq!(detector.sample(true), Some(ClockEdge::Rise));
        for _ in 0..10 {
            assert_eq!(detector.sample(true), None);
        }
    }

    #[test]
    fn rises_and_falls_alternate() {
        let mut detector = ClockDetector::new(0);
        let levels = [
            true, true, false, true, false, false, true, false, true, true,
        ];
        let mut rises = 0;
        let mut falls = 0;
        let mut last = None;
        for level in levels {
            if let Some(edge) = detector.sample(level) {
                // no two rises without an intervening fall, and vice versa
                assert_ne!(last, Some(edge));
                match edge {
                    ClockEdge::Rise => rises += 1,
                    ClockEdge::Fall => falls += 1,
                }
                last = Some(edge);
            }
        }
        // levels contain 4 low->high transitions (initial state counts as low)
        assert_eq!(rises, 4);
        assert_eq!(falls, 3);
    }

    #[test]
    fn disabled_detector_never_fires() {
        let mut detector = ClockDetector::disabled();
        assert_eq!(detector.source(), None);
        for level in [true, false, true, false] {
            assert_eq!(detector.sample(level), None);
        }
    }
}

//! Sample playback transport.
//!
//! Plays a sample table (a WAV baked into memory) by advancing a read
//! position whenever enough wall time has elapsed, so playback speed is
//! independent of the step loop rate. Consumers call [`Playback::run`] once
//! per cycle with the board's monotonic clock and read the current sample
//! value back out, typically to feed an analog output.
//!
//! Restarting mid-note would click, so [`Playback::restart`] first ramps the
//! current value to zero quickly (not instantly) before jumping back to the
//! start position.

/// Elapsed-time helper over a monotonic microsecond clock.
///
/// The caller supplies `now` from [`Board::now_micros`](crate::hal::Board);
/// the timer only remembers its epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    epoch_us: u64,
}

impl Timer {
    pub fn new(now_us: u64) -> Self {
        Self { epoch_us: now_us }
    }

    /// Restart the measured interval at `now_us`.
    pub fn reset(&mut self, now_us: u64) {
        self.epoch_us = now_us;
    }

    pub fn elapsed_us(&self, now_us: u64) -> u64 {
        now_us.saturating_sub(self.epoch_us)
    }

    pub fn elapsed_ms(&self, now_us: u64) -> u64 {
        self.elapsed_us(now_us) / 1_000
    }
}

/// Per-call decrement of the safe-restart fade ramp.
const FADE_STEP: i32 = 250;

/// Transport over an in-memory sample table.
#[derive(Debug, Clone)]
pub struct Playback {
    samples: Vec<i16>,
    /// Interval between position advances, in ms.
    rate_ms: u64,
    /// Positions skipped per advance.
    stride: usize,
    position: usize,
    start_position: usize,
    current_value: i32,
    paused: bool,
    looping: bool,
    /// Ramping the output to zero before an interruption-free restart.
    fading: bool,
    timer: Timer,
}

impl Playback {
    pub fn new(samples: Vec<i16>) -> Self {
        Self {
            samples,
            rate_ms: 100,
            stride: 1,
            position: 0,
            start_position: 0,
            current_value: 0,
            paused: true,
            looping: false,
            fading: false,
            timer: Timer::default(),
        }
    }

    pub fn set_rate_ms(&mut self, rate_ms: u64) {
        self.rate_ms = rate_ms;
    }

    pub fn set_stride(&mut self, stride: usize) {
        self.stride = stride.max(1);
    }

    pub fn set_start_position(&mut self, position: usize) {
        self.start_position = position;
    }

    /// Sample value at the current playback position.
    pub fn current_value(&self) -> i32 {
        self.current_value
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Jump back to the start position and hold, paused.
    pub fn rewind(&mut self, now_us: u64) {
        self.paused = true;
        self.position = self.start_position;
        self.timer.reset(now_us);
    }

    /// Rewind and play from the start, fading the current value to zero
    /// first so the jump cannot click.
    pub fn restart(&mut self, now_us: u64) {
        self.rewind(now_us);
        self.paused = false;
        self.fading = true;
    }

    /// Advance the transport. Call once per cycle.
    pub fn run(&mut self, now_us: u64) {
        // start position may have moved under us mid-stream
        if self.position < self.start_position {
            self.position = self.start_position;
        }

        if self.paused {
            return;
        }

        if self.fading {
            self.fade_toward_zero();
            return;
        }

        self.advance(now_us);

        if self.position >= self.samples.len() {
            if self.looping {
                self.restart(now_us);
            } else {
                self.rewind(now_us);
            }
        }
    }

    fn advance(&mut self, now_us: u64) {
        if self.timer.elapsed_ms(now_us) < self.rate_ms {
            return;
        }
        self.position += self.stride;
        if let Some(&sample) = self.samples.get(self.position) {
            self.current_value = i32::from(sample);
        }
        self.timer.reset(now_us);
    }

    /// Walk the output toward zero fast, without the timer: this should
    /// finish in a handful of cycles.
    fn fade_toward_zero(&mut self) {
        if self.current_value > 0 {
            self.current_value -= FADE_STEP;
            if self.current_value <= 0 {
                self.current_value = 0;
                self.fading = false;
            }
        } else {
            self.current_value += FADE_STEP;
            if self.current_value >= 0 {
                self.current_value = 0;
                self.fading = false;
            }
        }
    }
}

/// Fixed-timestep clock.
///
/// The simulation advances in whole ticks of `update_rate_ms`. Real frame
/// time is clamped and accumulated into a lag buffer; every full tick's
/// worth of lag is drained as one `update`.

use std::time::Duration;

pub const DEFAULT_UPDATE_RATE_MS: f32 = 16.667;
pub const DEFAULT_MAX_FRAME_MS: f32 = 33.333;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clock {
    pub update_rate_ms: f32,
}

impl Default for Clock {
    fn default() -> Self {
        Clock { update_rate_ms: DEFAULT_UPDATE_RATE_MS }
    }
}

impl Clock {
    pub fn new(update_rate_ms: f32) -> Self {
        Clock { update_rate_ms: update_rate_ms.max(1.0) }
    }

    /// Whole ticks that fit in `seconds` (rounded down).
    pub fn seconds_to_ticks(&self, seconds: f32) -> u32 {
        ((seconds * 1000.0) / self.update_rate_ms).floor().max(0.0) as u32
    }

    /// Ticks between two beats at `bpm`. Never zero.
    pub fn ticks_per_beat(&self, bpm: u32) -> u32 {
        let ms_per_beat = 60.0 / bpm.max(1) as f32 * 1000.0;
        ((ms_per_beat / self.update_rate_ms).floor() as u32).max(1)
    }
}

/// Lag accumulator for the host loop.
#[derive(Clone, Debug)]
pub struct FixedStep {
    clock: Clock,
    max_frame_ms: f32,
    lag_ms: f32,
}

impl FixedStep {
    pub fn new(clock: Clock, max_frame_ms: f32) -> Self {
        FixedStep { clock, max_frame_ms: max_frame_ms.max(clock.update_rate_ms), lag_ms: 0.0 }
    }

    /// Feed one frame's elapsed time; returns how many ticks to run.
    pub fn advance(&mut self, frame: Duration) -> u32 {
        let delta = (frame.as_secs_f32() * 1000.0).min(self.max_frame_ms);
        self.lag_ms += delta;
        let mut ticks = 0;
        while self.lag_ms >= self.clock.update_rate_ms {
            self.lag_ms -= self.clock.update_rate_ms;
            ticks += 1;
        }
        ticks
    }
}

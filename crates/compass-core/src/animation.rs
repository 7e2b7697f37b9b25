//! Time-driven animation primitives
//!
//! Callers own the clock: every method takes the current [`Instant`] so the
//! same code runs under the simulator frame loop and in tests.

use embassy_time::{Duration, Instant};

/// Easing curve applied to the normalized progress of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Cubic ease-out: fast start, gentle landing
    #[default]
    EaseOut,
    /// Cubic ease-in-out
    EaseInOut,
}

impl Easing {
    /// Map progress `t` (clamped to `[0, 1]`) through the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}

/// Fraction of `duration` elapsed between `start` and `now`, clamped to `[0, 1]`.
fn progress(start: Instant, duration: Duration, now: Instant) -> f32 {
    if duration.as_ticks() == 0 {
        return 1.0;
    }
    if now <= start {
        return 0.0;
    }

    let elapsed = (now - start).as_ticks();
    (elapsed as f32 / duration.as_ticks() as f32).min(1.0)
}

/// A scalar that moves towards its target over a timed transition.
///
/// Starting a new transition mid-flight begins from wherever the value
/// currently is, so retargeting never jumps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatedValue {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl AnimatedValue {
    pub fn new(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            start: Instant::from_ticks(0),
            duration: Duration::from_ticks(0),
            easing: Easing::Linear,
        }
    }

    /// Jump straight to `value`, cancelling any transition.
    pub fn set(&mut self, value: f32) {
        *self = Self::new(value);
    }

    /// Begin a transition from the value at `now` to `target`.
    pub fn animate_to(&mut self, target: f32, duration: Duration, easing: Easing, now: Instant) {
        self.from = self.value_at(now);
        self.to = target;
        self.start = now;
        self.duration = duration;
        self.easing = easing;
    }

    pub fn value_at(&self, now: Instant) -> f32 {
        let t = self.easing.apply(progress(self.start, self.duration, now));
        self.from + (self.to - self.from) * t
    }

    /// Final value of the current transition
    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        progress(self.start, self.duration, now) >= 1.0
    }
}

/// An endlessly repeating 0 → 1 → 0 oscillation.
///
/// Each leg (0 → 1 or 1 → 0) lasts `leg`; a full cycle is two legs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    leg: Duration,
    easing: Easing,
    started: Option<Instant>,
}

impl Pulse {
    pub fn new(leg: Duration, easing: Easing) -> Self {
        Self {
            leg,
            easing,
            started: None,
        }
    }

    /// Start oscillating from 0 at `now`. Does nothing if already running.
    pub fn start(&mut self, now: Instant) {
        if self.started.is_none() {
            self.started = Some(now);
        }
    }

    pub fn stop(&mut self) {
        self.started = None;
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Current pulse level in `[0, 1]`; 0 while stopped.
    pub fn value_at(&self, now: Instant) -> f32 {
        let Some(started) = self.started else {
            return 0.0;
        };

        let leg = self.leg.as_ticks();
        if leg == 0 || now <= started {
            return 0.0;
        }

        let phase = (now - started).as_ticks() % (2 * leg);
        let t = if phase < leg {
            phase as f32 / leg as f32
        } else {
            2.0 - phase as f32 / leg as f32
        };

        self.easing.apply(t)
    }
}

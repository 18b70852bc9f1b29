//! One-shot flicker signals read by the renderer.

use std::time::{Duration, Instant};

/// Timed toggle that alternates on every read while armed and reads off afterwards.
///
/// The toggle phase survives between activations, so a new flash starts from whichever
/// phase the previous one ended on.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlickerSignal {
    lit: bool,
    /// Arm instant and how long the flash lasts from it.
    armed: Option<(Instant, Duration)>,
}

impl FlickerSignal {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lit: false,
            armed: None,
        }
    }

    /// Keep the signal active for `duration` from `now`, replacing any earlier activation.
    ///
    /// The expiry is never materialised as an `Instant`, so arbitrarily long durations
    /// cannot overflow the clock.
    pub fn arm(&mut self, now: Instant, duration: Duration) {
        self.armed = Some((now, duration));
    }

    /// Whether reads at `now` still flicker.
    #[must_use]
    pub fn is_active(&self, now: Instant) -> bool {
        self.armed
            .is_some_and(|(at, duration)| now.saturating_duration_since(at) < duration)
    }

    /// Flip and return the phase while active; `false` once expired.
    pub fn sample(&mut self, now: Instant) -> bool {
        if !self.is_active(now) {
            return false;
        }
        self.lit = !self.lit;
        self.lit
    }
}

//! Rate limiting for gesture emission
//!
//! Both limiters take the current instant explicitly so callers (and tests)
//! control the clock. An elapsed time equal to the window still counts as
//! inside it.

use std::time::{Duration, Instant};

use crate::gesture::Direction;

/// Accepts any gesture once the cooldown since the last acceptance has passed
#[derive(Debug, Clone)]
pub struct Cooldown {
    period: Duration,
    last_accept: Option<Instant>,
}

impl Cooldown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_accept: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Returns the gesture if it is accepted; `None` input never touches the state
    pub fn accept(&mut self, gesture: Option<Direction>, now: Instant) -> Option<Direction> {
        let gesture = gesture?;
        if !window_elapsed(self.last_accept, self.period, now) {
            return None;
        }
        self.last_accept = Some(now);
        Some(gesture)
    }
}

/// Accepts a gesture only when it differs from the previous one and the
/// delay since the last acceptance has passed
#[derive(Debug, Clone)]
pub struct ChangeGate {
    delay: Duration,
    last_accept: Option<Instant>,
    previous: Option<Direction>,
}

impl ChangeGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_accept: None,
            previous: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn previous(&self) -> Option<Direction> {
        self.previous
    }

    /// Forget the previous gesture (the hand left the frame)
    ///
    /// The acceptance time is kept, so the delay still applies.
    pub fn reset_previous(&mut self) {
        self.previous = None;
    }

    pub fn accept(&mut self, gesture: Option<Direction>, now: Instant) -> Option<Direction> {
        let gesture = gesture?;
        if Some(gesture) == self.previous || !window_elapsed(self.last_accept, self.delay, now) {
            return None;
        }
        self.previous = Some(gesture);
        self.last_accept = Some(now);
        Some(gesture)
    }
}

fn window_elapsed(last: Option<Instant>, window: Duration, now: Instant) -> bool {
    match last {
        None => true,
        Some(last) => now.saturating_duration_since(last) > window,
    }
}

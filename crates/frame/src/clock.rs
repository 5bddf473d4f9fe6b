use std::time::{Duration, Instant};

/// Measures wall-clock time between frames.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    max_dt: f32,
}

impl FrameClock {
    /// `max_dt` caps the reported delta, in seconds.
    pub fn new(max_dt: f32) -> Self {
        Self { last: None, max_dt }
    }

    /// Seconds since the previous tick, clamped to `max_dt`. The first tick
    /// reports zero.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let elapsed = self
            .last
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last = Some(now);
        elapsed.as_secs_f32().min(self.max_dt)
    }

    /// Forget the previous tick, e.g. after the window was hidden.
    pub fn restart(&mut self) {
        self.last = None;
    }
}

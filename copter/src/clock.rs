use std::time::Instant;

/// Source of elapsed time between frames, in seconds
pub trait Clock {
    fn delta(&mut self) -> f32;
}

/// Wall clock; the first reading starts it and returns 0
#[derive(Debug, Default)]
pub struct WallClock {
    last: Option<Instant>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for WallClock {
    fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self.last.map_or(0.0, |last| (now - last).as_secs_f32());
        self.last = Some(now);
        dt
    }
}

/// Constant frame time, for headless runs and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f32);

impl Clock for FixedClock {
    fn delta(&mut self) -> f32 {
        self.0
    }
}

/// Frame time from browser-style millisecond timestamps (requestAnimationFrame)
#[derive(Debug, Default)]
pub struct TimestampClock {
    last_ms: Option<f64>,
}

impl TimestampClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous timestamp; 0 on the first call or if time ran backwards
    pub fn advance(&mut self, timestamp_ms: f64) -> f32 {
        let dt = self
            .last_ms
            .map_or(0.0, |last| ((timestamp_ms - last) / 1000.0).max(0.0) as f32);
        self.last_ms = Some(timestamp_ms);
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_starts_at_zero() {
        let mut clock = WallClock::new();
        assert_eq!(clock.delta(), 0.0);
        assert!(clock.delta() >= 0.0);
    }

    #[test]
    fn timestamps_become_seconds() {
        let mut clock = TimestampClock::new();
        assert_eq!(clock.advance(1000.0), 0.0);
        assert!((clock.advance(1016.0) - 0.016).abs() < 1e-6);
        assert_eq!(clock.advance(900.0), 0.0);
    }
}

//! Time utilities for game simulation

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 30; // 30 ticks per second

/// Target time between ticks
pub fn tick_interval() -> Duration {
    Duration::from_micros(1_000_000 / SIMULATION_TPS as u64)
}

/// Measures real elapsed time between ticks.
/// Late ticks report a larger delta; nothing is skipped or replayed.
#[derive(Debug, Clone)]
pub struct TickClock {
    last: Instant,
}

impl TickClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(last: Instant) -> Self {
        Self { last }
    }

    /// Seconds since the previous call (or construction)
    pub fn delta_secs(&mut self) -> f32 {
        self.delta_at(Instant::now())
    }

    pub fn delta_at(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        delta.as_secs_f32()
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_interval() {
        assert_eq!(tick_interval(), Duration::from_micros(33_333));
    }

    #[test]
    fn test_clock_measures_elapsed() {
        let start = Instant::now();
        let mut clock = TickClock::starting_at(start);

        let dt = clock.delta_at(start + Duration::from_millis(100));
        assert!((dt - 0.1).abs() < 1e-6);

        // A late tick gets the whole gap
        let dt = clock.delta_at(start + Duration::from_millis(350));
        assert!((dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_clock_never_negative() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut clock = TickClock::starting_at(start);
        assert_eq!(clock.delta_at(start - Duration::from_millis(10)), 0.0);
    }
}

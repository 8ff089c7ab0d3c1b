//! Tick-clock stopwatch.
//!
//! The timer never reads a system clock: every call takes the context's
//! `now()`, so combinators behave identically in simulation, tests and on the
//! robot.

use std::time::Duration;

/// Monotonic stopwatch driven by the tick clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    started_at: Option<Duration>,
    accumulated: Duration,
}

impl Timer {
    /// Stopped timer with zero elapsed time.
    pub const fn new() -> Self {
        Self {
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    /// Zero the elapsed time. A running timer keeps running from `now`.
    pub fn reset(&mut self, now: Duration) {
        self.accumulated = Duration::ZERO;
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
    }

    /// Start counting. No-op when already running.
    pub fn start(&mut self, now: Duration) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// `reset` + `start`.
    pub fn restart(&mut self, now: Duration) {
        self.accumulated = Duration::ZERO;
        self.started_at = Some(now);
    }

    /// Stop counting, keeping the elapsed time.
    pub fn stop(&mut self, now: Duration) {
        if let Some(started_at) = self.started_at.take() {
            self.accumulated += now.saturating_sub(started_at);
        }
    }

    #[inline]
    pub const fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Total counted time as of `now`.
    pub fn elapsed(&self, now: Duration) -> Duration {
        let running = self
            .started_at
            .map(|started_at| now.saturating_sub(started_at))
            .unwrap_or_default();
        self.accumulated + running
    }

    /// `elapsed(now) >= period`.
    #[inline]
    pub fn has_elapsed(&self, now: Duration, period: Duration) -> bool {
        self.elapsed(now) >= period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(secs: u64) -> Duration {
        Duration::from_secs(secs)
    }

    #[test]
    fn stopped_timer_reads_zero() {
        let timer = Timer::new();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed(s(10)), Duration::ZERO);
    }

    #[test]
    fn elapsed_tracks_clock() {
        let mut timer = Timer::new();
        timer.start(s(2));
        assert_eq!(timer.elapsed(s(5)), s(3));
        assert!(timer.has_elapsed(s(5), s(3)));
        assert!(!timer.has_elapsed(s(4), s(3)));
    }

    #[test]
    fn start_twice_keeps_origin() {
        let mut timer = Timer::new();
        timer.start(s(1));
        timer.start(s(4));
        assert_eq!(timer.elapsed(s(6)), s(5));
    }

    #[test]
    fn stop_accumulates() {
        let mut timer = Timer::new();
        timer.start(s(0));
        timer.stop(s(2));
        assert_eq!(timer.elapsed(s(100)), s(2));
        timer.start(s(10));
        assert_eq!(timer.elapsed(s(11)), s(3));
    }

    #[test]
    fn reset_running_timer_restarts_from_now() {
        let mut timer = Timer::new();
        timer.start(s(0));
        timer.reset(s(7));
        assert!(timer.is_running());
        assert_eq!(timer.elapsed(s(8)), s(1));
    }

    #[test]
    fn restart_discards_history() {
        let mut timer = Timer::new();
        timer.start(s(0));
        timer.stop(s(5));
        timer.restart(s(10));
        assert_eq!(timer.elapsed(s(12)), s(2));
    }
}

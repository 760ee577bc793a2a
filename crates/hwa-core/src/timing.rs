//! Lightweight stage timing.
//!
//! Timers report through `tracing` at debug level; the subscriber decides
//! whether anything is shown.

use std::time::Instant;

/// A simple timer that measures elapsed time for one stage.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Stop the timer, log it, and return elapsed seconds.
    pub fn stop_and_log(self) -> f64 {
        let elapsed = self.elapsed_s();
        tracing::debug!(stage = self.label, elapsed_s = elapsed, "stage finished");
        elapsed
    }
}

/// Accumulates time across repeated calls (e.g. one engine call per sample).
#[derive(Clone, Debug, Default)]
pub struct AccumulatingTimer {
    total_s: f64,
    count: u64,
}

impl AccumulatingTimer {
    pub const fn new() -> Self {
        Self {
            total_s: 0.0,
            count: 0,
        }
    }

    pub fn record(&mut self, duration_s: f64) {
        self.total_s += duration_s;
        self.count += 1;
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_s
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn average_seconds(&self) -> f64 {
        if self.count > 0 {
            self.total_s / self.count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulating_timer_averages() {
        let mut t = AccumulatingTimer::new();
        assert_eq!(t.average_seconds(), 0.0);
        t.record(1.0);
        t.record(3.0);
        assert_eq!(t.count(), 2);
        assert_eq!(t.total_seconds(), 4.0);
        assert_eq!(t.average_seconds(), 2.0);
    }

    #[test]
    fn timer_reports_non_negative_elapsed() {
        let t = Timer::start("test");
        assert!(t.stop_and_log() >= 0.0);
    }
}

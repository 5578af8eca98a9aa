//! Performance profiling helpers for tracking simulation timing.
//!
//! Provides RAII-style profiling scopes and per-step timing.

use std::time::Instant;
use tracing::trace;

/// A profiling scope that measures elapsed time using RAII.
///
/// The elapsed time is emitted as a `trace` event when dropped.
pub struct ProfilerScope {
    start: Instant,
    name: &'static str,
}

impl ProfilerScope {
    /// Creates a new profiling scope.
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Gets elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        trace!(scope = self.name, elapsed_ms = self.elapsed_ms(), "scope finished");
    }
}

/// Running timer over simulated days.
#[derive(Debug, Clone, Default)]
pub struct StepTimer {
    last_step_ms: f64,
    total_ms: f64,
    steps: u32,
}

impl StepTimer {
    /// Creates a new step timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the duration of one step in milliseconds.
    pub fn record(&mut self, time_ms: f64) {
        self.last_step_ms = time_ms;
        self.total_ms += time_ms;
        self.steps += 1;
    }

    /// Duration of the most recent step.
    pub fn last_step_ms(&self) -> f64 {
        self.last_step_ms
    }

    /// Sum of all recorded steps.
    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    /// Mean step duration, zero before the first step.
    pub fn mean_step_ms(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.total_ms / f64::from(self.steps)
        }
    }

    /// Number of recorded steps.
    pub fn steps(&self) -> u32 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_profiler_scope_measures_time() {
        let scope = ProfilerScope::new("test");
        thread::sleep(Duration::from_millis(10));
        let elapsed = scope.elapsed_ms();
        assert!(elapsed >= 10.0, "Expected at least 10ms, got {elapsed}");
    }

    #[test]
    fn test_step_timer() {
        let mut timer = StepTimer::new();
        assert_eq!(timer.last_step_ms(), 0.0);
        assert_eq!(timer.mean_step_ms(), 0.0);

        timer.record(16.0);
        assert_eq!(timer.last_step_ms(), 16.0);

        timer.record(8.0);
        assert_eq!(timer.last_step_ms(), 8.0);
        assert_eq!(timer.total_ms(), 24.0);
        assert_eq!(timer.mean_step_ms(), 12.0);
        assert_eq!(timer.steps(), 2);
    }
}

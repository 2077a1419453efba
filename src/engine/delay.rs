//! Delayed field-of-view multiplier
//!
//! Pose-folded FOV changes are held back by a short window so they land in
//! step with the compositor's own frame latency. Timestamps come from the
//! session clock, not wall time, so replayed tick sequences stay
//! deterministic.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct FovDelayer {
    samples: VecDeque<(f64, f32)>,
    last_emitted: f32,
}

impl Default for FovDelayer {
    fn default() -> Self {
        Self::new()
    }
}

impl FovDelayer {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
            last_emitted: 1.0,
        }
    }

    /// Records the multiplier computed this tick at session time `now`.
    pub fn push(&mut self, now: f64, multiplier: f32) {
        self.samples.push_back((now, multiplier));
    }

    /// Returns the newest sample that has aged past `window` seconds,
    /// dropping everything older. Until the first sample matures, the
    /// previously emitted value (initially neutral) is returned.
    pub fn delayed(&mut self, now: f64, window: f64) -> f32 {
        while let Some(&(stamp, multiplier)) = self.samples.front() {
            if now - stamp < window {
                break;
            }
            self.last_emitted = multiplier;
            self.samples.pop_front();
        }
        self.last_emitted
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_emitted = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_until_first_sample_matures() {
        let mut delayer = FovDelayer::new();
        delayer.push(0.0, 2.0);
        assert_eq!(delayer.delayed(0.01, 0.02), 1.0);
        assert_eq!(delayer.delayed(0.02, 0.02), 2.0);
    }

    #[test]
    fn emits_the_newest_matured_sample() {
        let mut delayer = FovDelayer::new();
        delayer.push(0.00, 2.0);
        delayer.push(0.01, 3.0);
        delayer.push(0.05, 4.0);

        // both early samples have aged past the window; the newest wins
        assert_eq!(delayer.delayed(0.04, 0.02), 3.0);
        // the late sample is still young
        assert_eq!(delayer.delayed(0.06, 0.02), 3.0);
        assert_eq!(delayer.delayed(0.08, 0.02), 4.0);
    }

    #[test]
    fn holds_last_value_when_queue_runs_dry() {
        let mut delayer = FovDelayer::new();
        delayer.push(0.0, 5.0);
        assert_eq!(delayer.delayed(1.0, 0.02), 5.0);
        assert_eq!(delayer.delayed(2.0, 0.02), 5.0);
    }

    #[test]
    fn clear_returns_to_neutral() {
        let mut delayer = FovDelayer::new();
        delayer.push(0.0, 5.0);
        delayer.delayed(1.0, 0.02);
        delayer.clear();
        assert_eq!(delayer.delayed(2.0, 0.02), 1.0);
    }
}

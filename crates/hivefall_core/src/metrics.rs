//! Rolling-window combat throughput counters.
//!
//! Informational only — nothing here feeds back into gameplay.

use std::collections::VecDeque;

/// Default measurement window in milliseconds.
const DEFAULT_WINDOW_MS: f64 = 5_000.0;

/// Attacks-per-second and validations-per-second over a rolling window.
#[derive(Debug, Clone)]
pub struct CombatMetrics {
    window_ms: f64,
    attacks: VecDeque<f64>,
    validations: VecDeque<f64>,
}

impl Default for CombatMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl CombatMetrics {
    /// Create counters with the given window length in milliseconds.
    #[must_use]
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            attacks: VecDeque::new(),
            validations: VecDeque::new(),
        }
    }

    /// Record one shot fired at clock time `now_ms`.
    pub fn record_attack(&mut self, now_ms: f64) {
        self.attacks.push_back(now_ms);
        Self::prune(&mut self.attacks, now_ms, self.window_ms);
    }

    /// Record one validation performed at clock time `now_ms`.
    pub fn record_validation(&mut self, now_ms: f64) {
        self.validations.push_back(now_ms);
        Self::prune(&mut self.validations, now_ms, self.window_ms);
    }

    /// Attacks per second over the window ending at `now_ms`.
    #[must_use]
    pub fn attacks_per_sec(&self, now_ms: f64) -> f64 {
        Self::rate(&self.attacks, now_ms, self.window_ms)
    }

    /// Validations per second over the window ending at `now_ms`.
    #[must_use]
    pub fn validations_per_sec(&self, now_ms: f64) -> f64 {
        Self::rate(&self.validations, now_ms, self.window_ms)
    }

    fn prune(samples: &mut VecDeque<f64>, now_ms: f64, window_ms: f64) {
        let cutoff = now_ms - window_ms;
        while samples.front().is_some_and(|&t| t < cutoff) {
            samples.pop_front();
        }
    }

    fn rate(samples: &VecDeque<f64>, now_ms: f64, window_ms: f64) -> f64 {
        let cutoff = now_ms - window_ms;
        let count = samples.iter().filter(|&&t| t >= cutoff).count();
        count as f64 / (window_ms / 1000.0)
    }
}

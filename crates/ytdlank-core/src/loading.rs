//! Cosmetic loading bar shown while metadata is fetched.
//!
//! Not tied to real progress: it creeps toward 96 % with easing and jumps to
//! 100 % when the request returns.

use rand::Rng;
use std::time::Duration;

/// Interval between ticks.
pub const TICK: Duration = Duration::from_millis(220);

const START_PERCENT: f64 = 6.0;
const CAP_PERCENT: f64 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadingBar {
    percent: f64,
    done: bool,
}

impl LoadingBar {
    /// Starts at 6 % plus up to 6 % of `jitter` (expected in `[0, 1)`).
    pub fn start_with(jitter: f64) -> Self {
        Self {
            percent: START_PERCENT + jitter.clamp(0.0, 1.0) * 6.0,
            done: false,
        }
    }

    pub fn start() -> Self {
        Self::start_with(rand::rng().random::<f64>())
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advances one tick; growth slows as the bar fills and never passes 96 %.
    pub fn advance_with(&mut self, jitter: f64) {
        if self.done {
            return;
        }
        let inc = 0.6 + jitter.clamp(0.0, 1.0) * 1.6;
        self.percent = (self.percent + inc * (1.0 - self.percent / 100.0)).min(CAP_PERCENT);
    }

    pub fn advance(&mut self) {
        self.advance_with(rand::rng().random::<f64>());
    }

    pub fn finish(&mut self) {
        self.percent = 100.0;
        self.done = true;
    }

    /// Text bar of `width` cells, e.g. `[#####.....]  50%`.
    pub fn render(&self, width: usize) -> String {
        let filled = ((self.percent / 100.0) * width as f64).round() as usize;
        let filled = filled.min(width);
        format!(
            "[{}{}] {:>3.0}%",
            "#".repeat(filled),
            ".".repeat(width - filled),
            self.percent
        )
    }
}

//! Combo scoring
//!
//! Consecutive successes inside the window raise a score multiplier. A
//! failure or a lapsed window ends the combo.

use serde::{Deserialize, Serialize};

use crate::tuning::ComboTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboManager {
    count: u32,
    best: u32,
    timer: f32,
    tuning: ComboTuning,
}

impl ComboManager {
    pub fn new(tuning: ComboTuning) -> Self {
        Self {
            count: 0,
            best: 0,
            timer: 0.0,
            tuning,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn multiplier(&self) -> f32 {
        if self.count == 0 {
            return 1.0;
        }
        (1.0 + self.tuning.step * (self.count - 1) as f32).min(self.tuning.max_multiplier)
    }

    /// Count a success and return the points it is worth
    pub fn register(&mut self, base_points: u64) -> u64 {
        self.count += 1;
        self.best = self.best.max(self.count);
        self.timer = 0.0;
        (base_points as f32 * self.multiplier()).round() as u64
    }

    /// End the combo; returns its length if one was running
    pub fn break_combo(&mut self) -> Option<u32> {
        if self.count == 0 {
            return None;
        }
        let count = self.count;
        self.count = 0;
        self.timer = 0.0;
        Some(count)
    }

    /// Returns the combo length when the window lapses
    pub fn update(&mut self, dt: f32) -> Option<u32> {
        if self.count == 0 {
            return None;
        }
        self.timer += dt;
        if self.timer >= self.tuning.window {
            return self.break_combo();
        }
        None
    }
}

//! Time-based spawn pressure, independent of chapters

use serde::{Deserialize, Serialize};

use crate::tuning::DifficultyTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyController {
    elapsed: f32,
    tuning: DifficultyTuning,
}

impl DifficultyController {
    pub fn new(tuning: DifficultyTuning) -> Self {
        Self { elapsed: 0.0, tuning }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Multiplier on the node spawn interval (shrinks over time)
    pub fn spawn_interval_modifier(&self) -> f32 {
        (1.0 - self.tuning.ramp_per_second * self.elapsed).max(self.tuning.min_interval_modifier)
    }

    /// Extra node slots unlocked so far
    pub fn extra_node_capacity(&self) -> usize {
        if self.tuning.capacity_step_seconds <= 0.0 {
            return 0;
        }
        let steps = (self.elapsed / self.tuning.capacity_step_seconds).floor() as usize;
        steps.min(self.tuning.max_extra_nodes)
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_and_floor() {
        let mut d = DifficultyController::new(DifficultyTuning::default());
        assert_eq!(d.spawn_interval_modifier(), 1.0);
        d.update(100.0);
        assert!((d.spawn_interval_modifier() - 0.8).abs() < 1e-5);
        d.update(1000.0);
        assert_eq!(d.spawn_interval_modifier(), 0.45);
    }

    #[test]
    fn test_capacity_steps() {
        let mut d = DifficultyController::new(DifficultyTuning::default());
        assert_eq!(d.extra_node_capacity(), 0);
        d.update(44.0);
        assert_eq!(d.extra_node_capacity(), 0);
        d.update(2.0);
        assert_eq!(d.extra_node_capacity(), 1);
        d.update(10_000.0);
        assert_eq!(d.extra_node_capacity(), 4);
        d.reset();
        assert_eq!(d.extra_node_capacity(), 0);
    }
}

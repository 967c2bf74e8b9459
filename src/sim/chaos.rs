//! Global chaos pressure
//!
//! Chaos always creeps up; correct stabilizations are the only way down.
//! Node decay reads the smoothed `display_chaos`, never the raw level, so
//! difficulty follows chaos with a lag instead of jittering.

use serde::{Deserialize, Serialize};

use crate::tuning::ChaosTuning;

/// Threshold crossings worth telling the presentation layer about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChaosSignal {
    CriticalLoadEntered,
    CriticalLoadCleared,
    /// Chaos hit the cap
    Overloaded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaosSystem {
    chaos_level: f32,
    display_chaos: f32,
    recent_wrong_actions: u32,
    window_timer: f32,
    recovery_modifier: f32,
    penalty_modifier: f32,
    critical: bool,
    overloaded: bool,
    tuning: ChaosTuning,
}

impl ChaosSystem {
    pub fn new(tuning: ChaosTuning) -> Self {
        Self {
            chaos_level: 0.0,
            display_chaos: 0.0,
            recent_wrong_actions: 0,
            window_timer: 0.0,
            recovery_modifier: 1.0,
            penalty_modifier: 1.0,
            critical: false,
            overloaded: false,
            tuning,
        }
    }

    #[inline]
    pub fn chaos_level(&self) -> f32 {
        self.chaos_level
    }

    pub fn display_chaos(&self) -> f32 {
        self.display_chaos
    }

    pub fn recent_wrong_actions(&self) -> u32 {
        self.recent_wrong_actions
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn chaos_cap(&self) -> f32 {
        self.tuning.chaos_cap
    }

    /// Chapter coefficients: recovery scales the stabilization decrease,
    /// penalty scales explosion and wrong-action increases
    pub fn set_modifiers(&mut self, recovery: f32, penalty: f32) {
        self.recovery_modifier = recovery;
        self.penalty_modifier = penalty;
    }

    /// Multiplier fed into node decay
    pub fn decay_rate_multiplier(&self) -> f32 {
        if self.tuning.max_chaos <= 0.0 {
            return 1.0;
        }
        1.0 + (self.display_chaos / self.tuning.max_chaos) * (self.tuning.multiplier_max - 1.0)
    }

    pub fn update(&mut self, dt: f32, unstable_node_count: usize) -> Vec<ChaosSignal> {
        let mut growth = self.tuning.passive_increase * dt
            + self.tuning.unstable_node_increase * unstable_node_count as f32 * dt;
        if self.recent_wrong_actions > 2 {
            growth += (self.recent_wrong_actions - 2) as f32 * 0.5 * dt;
        }
        self.add(growth);

        self.window_timer += dt;
        if self.window_timer >= self.tuning.wrong_action_window {
            self.window_timer = 0.0;
            self.recent_wrong_actions = self.recent_wrong_actions.saturating_sub(1);
        }

        self.display_chaos += (self.chaos_level - self.display_chaos) * self.tuning.display_smoothing;

        self.signals()
    }

    pub fn on_explosion(&mut self) {
        self.on_explosion_scaled(1.0);
    }

    /// Explosion whose penalty is scaled by the node kind
    pub fn on_explosion_scaled(&mut self, scale: f32) {
        self.add(self.tuning.explosion_increase * scale * self.penalty_modifier);
        self.recent_wrong_actions += 1;
        self.window_timer = 0.0;
    }

    pub fn on_stabilization(&mut self) {
        self.add(-self.tuning.stabilization_recovery * self.tuning.explosion_increase * self.recovery_modifier);
        self.recent_wrong_actions = self.recent_wrong_actions.saturating_sub(1);
    }

    /// Near miss: wrong polarity without an explosion
    pub fn on_wrong_action(&mut self) {
        self.add(self.tuning.rapid_action_increase * self.penalty_modifier);
        self.recent_wrong_actions += 1;
    }

    /// Threshold crossings since the last call
    pub fn signals(&mut self) -> Vec<ChaosSignal> {
        let mut signals = Vec::new();
        let critical = self.chaos_level >= self.tuning.critical_threshold;
        if critical != self.critical {
            self.critical = critical;
            signals.push(if critical {
                ChaosSignal::CriticalLoadEntered
            } else {
                ChaosSignal::CriticalLoadCleared
            });
        }
        let overloaded = self.chaos_level >= self.tuning.chaos_cap;
        if overloaded && !self.overloaded {
            signals.push(ChaosSignal::Overloaded);
        }
        self.overloaded = overloaded;
        signals
    }

    /// Drop all pressure. Reports `CriticalLoadCleared` if the core was critical.
    pub fn reset(&mut self) -> Option<ChaosSignal> {
        let was_critical = self.critical;
        self.chaos_level = 0.0;
        self.display_chaos = 0.0;
        self.recent_wrong_actions = 0;
        self.window_timer = 0.0;
        self.critical = false;
        self.overloaded = false;
        was_critical.then_some(ChaosSignal::CriticalLoadCleared)
    }

    fn add(&mut self, delta: f32) {
        self.chaos_level = (self.chaos_level + delta).clamp(0.0, self.tuning.chaos_cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chaos() -> ChaosSystem {
        ChaosSystem::new(ChaosTuning::default())
    }

    #[test]
    fn test_explosion_then_stabilization() {
        let mut c = chaos();
        c.on_explosion();
        assert_eq!(c.chaos_level(), 15.0);
        assert_eq!(c.recent_wrong_actions(), 1);
        c.on_stabilization();
        assert!((c.chaos_level() - 3.0).abs() < 1e-4);
        assert_eq!(c.recent_wrong_actions(), 0);
    }

    #[test]
    fn test_passive_growth_cannot_be_waited_out() {
        let mut c = chaos();
        c.update(10.0, 0);
        assert!((c.chaos_level() - 5.0).abs() < 1e-4);
        c.update(1.0, 4);
        assert!((c.chaos_level() - 6.7).abs() < 1e-4);
    }

    #[test]
    fn test_panic_amplification() {
        let mut c = chaos();
        for _ in 0..4 {
            c.on_wrong_action();
        }
        let before = c.chaos_level();
        c.update(1.0, 0);
        // passive 0.5 + (4 - 2) * 0.5
        assert!((c.chaos_level() - before - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_window_decays_one_at_a_time() {
        let mut c = chaos();
        c.on_wrong_action();
        c.on_wrong_action();
        c.update(2.9, 0);
        assert_eq!(c.recent_wrong_actions(), 2);
        c.update(0.2, 0);
        assert_eq!(c.recent_wrong_actions(), 1);
        c.update(3.0, 0);
        assert_eq!(c.recent_wrong_actions(), 0);
        c.update(3.0, 0);
        assert_eq!(c.recent_wrong_actions(), 0);
    }

    #[test]
    fn test_display_lags_and_drives_multiplier() {
        let mut c = chaos();
        c.on_explosion();
        assert_eq!(c.decay_rate_multiplier(), 1.0);
        c.update(0.0, 0);
        assert!((c.display_chaos() - 0.75).abs() < 1e-4);
        assert!(c.display_chaos() < c.chaos_level());
        assert!((c.decay_rate_multiplier() - (1.0 + 0.0075 * 1.5)).abs() < 1e-5);
    }

    #[test]
    fn test_floor_and_signals() {
        let mut c = chaos();
        c.on_stabilization();
        assert_eq!(c.chaos_level(), 0.0);

        for _ in 0..6 {
            c.on_explosion();
        }
        assert_eq!(c.chaos_level(), 90.0);
        assert_eq!(c.signals(), vec![ChaosSignal::CriticalLoadEntered]);
        c.on_explosion();
        assert_eq!(c.chaos_level(), 100.0);
        assert_eq!(c.signals(), vec![ChaosSignal::Overloaded]);
        assert!(c.signals().is_empty());
        assert_eq!(c.reset(), Some(ChaosSignal::CriticalLoadCleared));
        assert_eq!(c.chaos_level(), 0.0);
        assert!(!c.is_critical());
        assert_eq!(c.reset(), None);
    }

    #[test]
    fn test_chapter_modifiers() {
        let mut c = chaos();
        c.set_modifiers(0.5, 2.0);
        c.on_explosion();
        assert_eq!(c.chaos_level(), 30.0);
        c.on_stabilization();
        assert!((c.chaos_level() - 24.0).abs() < 1e-4);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Update(f32, usize),
            Explosion(f32),
            Stabilization,
            Wrong,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0.0f32..5.0, 0usize..20).prop_map(|(dt, n)| Op::Update(dt, n)),
                (0.0f32..3.0).prop_map(Op::Explosion),
                Just(Op::Stabilization),
                Just(Op::Wrong),
            ]
        }

        proptest! {
            #[test]
            fn prop_chaos_always_clamped(ops in proptest::collection::vec(op(), 0..200), recovery in 0.0f32..2.0, penalty in 0.0f32..3.0) {
                let mut c = chaos();
                c.set_modifiers(recovery, penalty);
                for op in ops {
                    match op {
                        Op::Update(dt, n) => { c.update(dt, n); }
                        Op::Explosion(scale) => c.on_explosion_scaled(scale),
                        Op::Stabilization => c.on_stabilization(),
                        Op::Wrong => c.on_wrong_action(),
                    }
                    prop_assert!(c.chaos_level() >= 0.0);
                    prop_assert!(c.chaos_level() <= c.chaos_cap());
                    prop_assert!(c.decay_rate_multiplier() >= 1.0);
                    prop_assert!(c.decay_rate_multiplier() <= 2.5 + 1e-4);
                }
            }
        }
    }
}

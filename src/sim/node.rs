//! Energy nodes orbiting the core
//!
//! All four kinds share one decay/stabilize/explode protocol. Per-kind
//! differences come from [`NodeKind::profile`] and the polarity rule in
//! [`EnergyNode::matches_polarity`].
//!
//! Lifecycle: spawning -> active -> (stabilizing -> stabilized | exploded).
//! Stabilized and exploded are terminal; a terminal node emits nothing else.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::NodeTuning;

/// Node variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Normal,
    /// Decays fast, takes neighbours with it when it blows
    Volatile,
    /// Periodically phases out; cannot be matched while phased
    Phase,
    /// Trap node: any beam is the wrong beam
    Fake,
}

/// Per-kind behaviour table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeKindProfile {
    pub decay_multiplier: f32,
    /// Radius of the chain blast (0 = none)
    pub chain_radius: f32,
    /// Stability removed from nodes caught in the chain blast
    pub chain_damage: f32,
    /// Scale applied to the chaos penalty of this node's explosion
    pub chaos_penalty: f32,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Normal,
        NodeKind::Volatile,
        NodeKind::Phase,
        NodeKind::Fake,
    ];

    pub const fn profile(self) -> NodeKindProfile {
        match self {
            NodeKind::Normal => NodeKindProfile {
                decay_multiplier: 1.0,
                chain_radius: 0.0,
                chain_damage: 0.0,
                chaos_penalty: 1.0,
            },
            NodeKind::Volatile => NodeKindProfile {
                decay_multiplier: 1.6,
                chain_radius: 90.0,
                chain_damage: 35.0,
                chaos_penalty: 1.5,
            },
            NodeKind::Phase => NodeKindProfile {
                decay_multiplier: 1.0,
                chain_radius: 0.0,
                chain_damage: 0.0,
                chaos_penalty: 1.0,
            },
            NodeKind::Fake => NodeKindProfile {
                decay_multiplier: 0.6,
                chain_radius: 0.0,
                chain_damage: 0.0,
                chaos_penalty: 0.5,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Normal => "normal",
            NodeKind::Volatile => "volatile",
            NodeKind::Phase => "phase",
            NodeKind::Fake => "fake",
        }
    }
}

/// Charge carried by nodes and beams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    Positive,
    Negative,
}

impl Polarity {
    pub fn sign(self) -> i8 {
        match self {
            Polarity::Positive => 1,
            Polarity::Negative => -1,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }

    pub fn from_bool(positive: bool) -> Self {
        if positive {
            Polarity::Positive
        } else {
            Polarity::Negative
        }
    }
}

/// One-shot terminal outcome of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeOutcome {
    Exploded {
        id: u32,
        kind: NodeKind,
        position: Vec2,
    },
    Stabilized {
        id: u32,
        kind: NodeKind,
        position: Vec2,
    },
}

impl NodeOutcome {
    pub fn node_id(&self) -> u32 {
        match self {
            NodeOutcome::Exploded { id, .. } | NodeOutcome::Stabilized { id, .. } => *id,
        }
    }
}

/// Result of feeding stabilization energy into a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stabilization {
    /// Node is not stabilizing or already terminal
    Rejected,
    Applied,
    Completed(NodeOutcome),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyNode {
    pub id: u32,
    pub kind: NodeKind,
    pub polarity: Polarity,
    pub position: Vec2,
    stability: f32,
    max_stability: f32,
    decay_rate: f32,
    is_stabilizing: bool,
    has_exploded: bool,
    is_stabilized: bool,
    is_phasing: bool,
    phase_timer: f32,
    phase_interval: f32,
    age: f32,
    spawn_duration: f32,
}

impl EnergyNode {
    pub fn new(
        id: u32,
        kind: NodeKind,
        polarity: Polarity,
        position: Vec2,
        stability: f32,
        tuning: &NodeTuning,
    ) -> Self {
        Self {
            id,
            kind,
            polarity,
            position,
            stability: stability.clamp(0.0, tuning.max_stability),
            max_stability: tuning.max_stability,
            decay_rate: tuning.base_decay_rate,
            is_stabilizing: false,
            has_exploded: false,
            is_stabilized: false,
            is_phasing: false,
            phase_timer: 0.0,
            phase_interval: tuning.phase_interval,
            age: 0.0,
            spawn_duration: tuning.spawn_duration,
        }
    }

    #[inline]
    pub fn stability(&self) -> f32 {
        self.stability
    }

    pub fn max_stability(&self) -> f32 {
        self.max_stability
    }

    pub fn stability_ratio(&self) -> f32 {
        if self.max_stability <= 0.0 {
            return 0.0;
        }
        self.stability / self.max_stability
    }

    /// Decay per second before the chaos multiplier
    pub fn decay_rate(&self) -> f32 {
        self.decay_rate * self.kind.profile().decay_multiplier
    }

    pub fn is_stabilizing(&self) -> bool {
        self.is_stabilizing
    }

    pub fn has_exploded(&self) -> bool {
        self.has_exploded
    }

    pub fn is_stabilized(&self) -> bool {
        self.is_stabilized
    }

    pub fn is_terminal(&self) -> bool {
        self.has_exploded || self.is_stabilized
    }

    pub fn is_phasing(&self) -> bool {
        self.is_phasing
    }

    /// Still playing its spawn-in animation (cosmetic only)
    pub fn is_spawning(&self) -> bool {
        self.age < self.spawn_duration
    }

    pub fn is_unstable(&self, threshold: f32) -> bool {
        !self.is_terminal() && self.stability_ratio() < threshold
    }

    /// Advance decay and phasing
    pub fn update(&mut self, dt: f32, chaos_multiplier: f32) -> Option<NodeOutcome> {
        if self.is_terminal() {
            return None;
        }
        self.age += dt;

        if self.kind == NodeKind::Phase && self.phase_interval > 0.0 {
            self.phase_timer += dt;
            while self.phase_timer >= self.phase_interval {
                self.phase_timer -= self.phase_interval;
                self.is_phasing = !self.is_phasing;
            }
        }

        if self.is_stabilizing {
            return None;
        }

        self.stability = (self.stability - self.decay_rate() * chaos_multiplier * dt).max(0.0);
        if self.stability <= 0.0 {
            return self.explode();
        }
        None
    }

    /// Lock the node for stabilization; decay stops while held
    pub fn start_stabilizing(&mut self) -> bool {
        if self.is_terminal() || self.is_stabilizing {
            return false;
        }
        self.is_stabilizing = true;
        true
    }

    /// Release a held node back to normal decay
    pub fn stop_stabilizing(&mut self) -> bool {
        if self.is_terminal() || !self.is_stabilizing {
            return false;
        }
        self.is_stabilizing = false;
        true
    }

    pub fn apply_stabilization(&mut self, amount: f32) -> Stabilization {
        if !self.is_stabilizing || self.is_terminal() {
            return Stabilization::Rejected;
        }
        self.stability = (self.stability + amount).min(self.max_stability);
        if self.stability >= self.max_stability {
            return match self.complete_stabilization() {
                Some(outcome) => Stabilization::Completed(outcome),
                None => Stabilization::Rejected,
            };
        }
        Stabilization::Applied
    }

    /// Whether a beam of `beam` polarity is a correct match
    pub fn matches_polarity(&self, beam: Polarity) -> bool {
        match self.kind {
            NodeKind::Normal | NodeKind::Volatile => self.polarity == beam,
            NodeKind::Phase => !self.is_phasing && self.polarity == beam,
            NodeKind::Fake => false,
        }
    }

    /// Knock stability off from outside (chain blasts); may explode the node
    pub fn damage(&mut self, amount: f32) -> Option<NodeOutcome> {
        if self.is_terminal() {
            return None;
        }
        self.stability = (self.stability - amount).max(0.0);
        if self.stability <= 0.0 {
            return self.explode();
        }
        None
    }

    pub fn explode(&mut self) -> Option<NodeOutcome> {
        if self.is_terminal() {
            return None;
        }
        self.has_exploded = true;
        self.is_stabilizing = false;
        self.stability = 0.0;
        Some(NodeOutcome::Exploded {
            id: self.id,
            kind: self.kind,
            position: self.position,
        })
    }

    pub fn complete_stabilization(&mut self) -> Option<NodeOutcome> {
        if self.is_terminal() {
            return None;
        }
        self.is_stabilized = true;
        self.is_stabilizing = false;
        self.stability = self.max_stability;
        Some(NodeOutcome::Stabilized {
            id: self.id,
            kind: self.kind,
            position: self.position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind, stability: f32) -> EnergyNode {
        EnergyNode::new(1, kind, Polarity::Positive, Vec2::new(150.0, 0.0), stability, &NodeTuning::default())
    }

    #[test]
    fn test_decay_then_explode() {
        let mut n = node(NodeKind::Normal, 80.0);
        assert!(n.update(10.0, 1.0).is_none());
        assert!((n.stability() - 50.0).abs() < 1e-4);

        let outcome = n.update(17.0, 1.0);
        assert!(matches!(outcome, Some(NodeOutcome::Exploded { id: 1, .. })));
        assert_eq!(n.stability(), 0.0);
        assert!(n.has_exploded());

        assert!(n.update(1.0, 1.0).is_none());
        assert!(n.explode().is_none());
    }

    #[test]
    fn test_chaos_multiplier_speeds_decay() {
        let mut n = node(NodeKind::Normal, 80.0);
        n.update(1.0, 2.0);
        assert!((n.stability() - 74.0).abs() < 1e-4);
    }

    #[test]
    fn test_stabilizing_pauses_decay() {
        let mut n = node(NodeKind::Volatile, 50.0);
        assert!(n.start_stabilizing());
        assert!(!n.start_stabilizing());
        n.update(5.0, 2.0);
        assert_eq!(n.stability(), 50.0);
    }

    #[test]
    fn test_stabilization_requires_lock() {
        let mut n = node(NodeKind::Normal, 50.0);
        assert_eq!(n.apply_stabilization(10.0), Stabilization::Rejected);
        assert_eq!(n.stability(), 50.0);

        n.start_stabilizing();
        assert_eq!(n.apply_stabilization(10.0), Stabilization::Applied);
        assert!(matches!(
            n.apply_stabilization(100.0),
            Stabilization::Completed(NodeOutcome::Stabilized { .. })
        ));
        assert_eq!(n.stability(), 100.0);
        assert!(n.is_stabilized());
        assert_eq!(n.apply_stabilization(10.0), Stabilization::Rejected);
        assert!(n.complete_stabilization().is_none());
    }

    #[test]
    fn test_polarity_rules() {
        let normal = node(NodeKind::Normal, 50.0);
        assert!(normal.matches_polarity(Polarity::Positive));
        assert!(!normal.matches_polarity(Polarity::Negative));

        let fake = node(NodeKind::Fake, 50.0);
        assert!(!fake.matches_polarity(Polarity::Positive));
        assert!(!fake.matches_polarity(Polarity::Negative));
    }

    #[test]
    fn test_phase_toggles() {
        let mut n = node(NodeKind::Phase, 90.0);
        assert!(n.matches_polarity(Polarity::Positive));
        n.update(1.6, 0.0);
        assert!(n.is_phasing());
        assert!(!n.matches_polarity(Polarity::Positive));
        n.update(1.5, 0.0);
        assert!(!n.is_phasing());
        assert!(n.matches_polarity(Polarity::Positive));
    }

    #[test]
    fn test_chain_damage_explodes_once() {
        let mut n = node(NodeKind::Normal, 30.0);
        assert!(n.damage(10.0).is_none());
        assert!(n.damage(35.0).is_some());
        assert!(n.damage(35.0).is_none());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn kind() -> impl Strategy<Value = NodeKind> {
            prop::sample::select(NodeKind::ALL.to_vec())
        }

        proptest! {
            #[test]
            fn prop_stability_bounded_and_single_explosion(
                kind in kind(),
                start in 0.0f32..100.0,
                steps in proptest::collection::vec((0.0f32..2.0, 0.5f32..3.0, any::<bool>(), 0.0f32..40.0), 1..80),
            ) {
                let mut n = node(kind, start);
                let mut explosions = 0;
                for (dt, chaos, stabilize, amount) in steps {
                    if stabilize {
                        n.start_stabilizing();
                        if let Stabilization::Completed(NodeOutcome::Exploded { .. }) = n.apply_stabilization(amount) {
                            explosions += 1;
                        }
                    } else {
                        n.stop_stabilizing();
                    }
                    if let Some(NodeOutcome::Exploded { .. }) = n.update(dt, chaos) {
                        explosions += 1;
                    }
                    prop_assert!(n.stability() >= 0.0);
                    prop_assert!(n.stability() <= n.max_stability());
                }
                prop_assert!(explosions <= 1);
                if n.has_exploded() {
                    prop_assert!(!n.is_stabilized());
                }
            }
        }
    }
}

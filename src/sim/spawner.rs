//! Node spawning and ownership
//!
//! The spawner owns every live node. Other systems hold [`NodeKey`] handles
//! and resolve them each tick, so a removed node simply stops resolving.

use std::collections::VecDeque;

use glam::Vec2;
use slotmap::{SlotMap, new_key_type};

use super::node::{EnergyNode, NodeKind, NodeOutcome, Polarity};
use super::random::DeterministicRandom;
use crate::polar_to_cartesian;
use crate::tuning::{NodeTuning, SpawnerTuning};

new_key_type! {
    /// Generational handle to a node owned by the [`NodeSpawner`]
    pub struct NodeKey;
}

#[derive(Debug, Clone)]
pub struct NodeSpawner {
    nodes: SlotMap<NodeKey, EnergyNode>,
    /// Insertion order; lock checks walk nodes in this order
    order: Vec<NodeKey>,
    rng: DeterministicRandom,
    core_position: Vec2,
    spawn_timer: f32,
    interval_modifier: f32,
    extra_capacity: usize,
    next_id: u32,
    tuning: SpawnerTuning,
    node_tuning: NodeTuning,
}

impl NodeSpawner {
    pub fn new(rng: DeterministicRandom, tuning: SpawnerTuning, node_tuning: NodeTuning) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            order: Vec::new(),
            rng,
            core_position: Vec2::ZERO,
            spawn_timer: 0.0,
            interval_modifier: 1.0,
            extra_capacity: 0,
            next_id: 1,
            tuning,
            node_tuning,
        }
    }

    pub fn core_position(&self) -> Vec2 {
        self.core_position
    }

    pub fn set_core_position(&mut self, position: Vec2) {
        self.core_position = position;
    }

    /// Scale on the spawn interval (chapter/difficulty pressure)
    pub fn set_interval_modifier(&mut self, modifier: f32) {
        self.interval_modifier = modifier.max(0.01);
    }

    pub fn set_extra_capacity(&mut self, extra: usize) {
        self.extra_capacity = extra;
    }

    pub fn max_active_nodes(&self) -> usize {
        self.tuning.max_active_nodes + self.extra_capacity
    }

    pub fn node_tuning(&self) -> &NodeTuning {
        &self.node_tuning
    }

    pub fn get(&self, key: NodeKey) -> Option<&EnergyNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut EnergyNode> {
        self.nodes.get_mut(key)
    }

    /// Nodes in spawn order
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &EnergyNode)> + '_ {
        self.order.iter().filter_map(|&key| self.nodes.get(key).map(|n| (key, n)))
    }

    pub fn keys(&self) -> &[NodeKey] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes that are neither exploded nor stabilized
    pub fn live_count(&self) -> usize {
        self.nodes.values().filter(|n| !n.is_terminal()).count()
    }

    pub fn unstable_count(&self) -> usize {
        let threshold = self.node_tuning.unstable_threshold;
        self.nodes.values().filter(|n| n.is_unstable(threshold)).count()
    }

    /// Decay every node, resolve chain blasts, then spawn if due
    pub fn update(&mut self, dt: f32, decay_multiplier: f32) -> SpawnerReport {
        let mut report = SpawnerReport::default();

        let mut blasts = Vec::new();
        for &key in &self.order {
            if let Some(node) = self.nodes.get_mut(key)
                && let Some(outcome) = node.update(dt, decay_multiplier)
            {
                blasts.push(key);
                report.outcomes.push(outcome);
            }
        }
        for key in blasts {
            self.propagate_chain(key, &mut report.outcomes);
        }

        self.spawn_timer += dt;
        let interval = self.tuning.spawn_interval * self.interval_modifier;
        if self.spawn_timer >= interval {
            if self.live_count() < self.max_active_nodes() {
                let key = self.spawn_node();
                report.spawned.push(key);
                self.spawn_timer = 0.0;
            } else {
                // Hold the timer so a freed slot refills immediately
                self.spawn_timer = interval;
            }
        }

        report
    }

    /// Spawn one node immediately, ignoring the timer and cap
    pub fn spawn_node(&mut self) -> NodeKey {
        let kind = self.select_kind();
        let polarity = Polarity::from_bool(self.rng.next_bool());
        let position = self.spawn_position();
        let stability = self
            .rng
            .range(self.node_tuning.min_initial_stability, self.node_tuning.max_initial_stability);
        let key = self.insert_node(kind, polarity, position, stability);
        log::debug!("Spawned {} node at ({:.0}, {:.0})", kind.as_str(), position.x, position.y);
        key
    }

    /// Place a node with explicit parameters
    pub fn insert_node(&mut self, kind: NodeKind, polarity: Polarity, position: Vec2, stability: f32) -> NodeKey {
        let id = self.next_id;
        self.next_id += 1;
        let node = EnergyNode::new(id, kind, polarity, position, stability, &self.node_tuning);
        let key = self.nodes.insert(node);
        self.order.push(key);
        key
    }

    /// Independent rolls in priority order: volatile, phase, fake; else normal
    pub fn select_kind(&mut self) -> NodeKind {
        if self.rng.chance(self.tuning.volatile_chance) {
            NodeKind::Volatile
        } else if self.rng.chance(self.tuning.phase_chance) {
            NodeKind::Phase
        } else if self.rng.chance(self.tuning.fake_chance) {
            NodeKind::Fake
        } else {
            NodeKind::Normal
        }
    }

    /// Random point in the spawn annulus around the core
    pub fn spawn_position(&mut self) -> Vec2 {
        let angle = self.rng.angle();
        let radius = self
            .rng
            .range(self.tuning.min_spawn_distance, self.tuning.max_spawn_distance);
        self.core_position + polar_to_cartesian(radius, angle)
    }

    /// Explode a node from outside and resolve any chain it sets off
    pub fn explode_node(&mut self, key: NodeKey) -> Vec<NodeOutcome> {
        let mut outcomes = Vec::new();
        if let Some(outcome) = self.nodes.get_mut(key).and_then(EnergyNode::explode) {
            outcomes.push(outcome);
            self.propagate_chain(key, &mut outcomes);
        }
        outcomes
    }

    /// Breadth-first chain blasts starting from an exploded node
    fn propagate_chain(&mut self, origin: NodeKey, outcomes: &mut Vec<NodeOutcome>) {
        let mut queue = VecDeque::from([origin]);
        while let Some(source) = queue.pop_front() {
            let Some(node) = self.nodes.get(source) else {
                continue;
            };
            let profile = node.kind.profile();
            if profile.chain_radius <= 0.0 {
                continue;
            }
            let center = node.position;
            let radius_sq = profile.chain_radius * profile.chain_radius;
            for &key in &self.order {
                if key == source {
                    continue;
                }
                if let Some(other) = self.nodes.get_mut(key)
                    && other.position.distance_squared(center) <= radius_sq
                    && let Some(outcome) = other.damage(profile.chain_damage)
                {
                    outcomes.push(outcome);
                    queue.push_back(key);
                }
            }
        }
    }

    /// Drop terminal nodes
    pub fn prune_terminal(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|_, node| !node.is_terminal());
        let nodes = &self.nodes;
        self.order.retain(|key| nodes.contains_key(*key));
        before - self.nodes.len()
    }

    /// Remove every node and restart the spawn timer
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.spawn_timer = 0.0;
    }
}

/// What happened to the node collection during one update
#[derive(Debug, Clone, Default)]
pub struct SpawnerReport {
    pub spawned: Vec<NodeKey>,
    pub outcomes: Vec<NodeOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawner(seed: u64) -> NodeSpawner {
        NodeSpawner::new(
            DeterministicRandom::new(seed),
            SpawnerTuning::default(),
            NodeTuning::default(),
        )
    }

    #[test]
    fn test_spawns_on_interval_up_to_cap() {
        let mut s = spawner(1);
        let report = s.update(1.0, 1.0);
        assert!(report.spawned.is_empty());
        let report = s.update(1.0, 1.0);
        assert_eq!(report.spawned.len(), 1);

        for _ in 0..40 {
            s.update(0.5, 0.0);
        }
        assert_eq!(s.live_count(), 6);
    }

    #[test]
    fn test_positions_stay_in_annulus() {
        let mut s = spawner(99);
        for _ in 0..200 {
            let p = s.spawn_position();
            let d = p.length();
            assert!((120.0..260.0).contains(&d), "distance {d}");
        }
    }

    #[test]
    fn test_same_seed_same_nodes() {
        let mut a = spawner(5);
        let mut b = spawner(5);
        for _ in 0..20 {
            a.spawn_node();
            b.spawn_node();
        }
        let left: Vec<_> = a.iter().map(|(_, n)| (n.kind, n.polarity, n.position)).collect();
        let right: Vec<_> = b.iter().map(|(_, n)| (n.kind, n.polarity, n.position)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_kind_priority_with_certain_volatile() {
        let mut s = NodeSpawner::new(
            DeterministicRandom::new(2),
            SpawnerTuning {
                volatile_chance: 1.0,
                phase_chance: 1.0,
                fake_chance: 1.0,
                ..SpawnerTuning::default()
            },
            NodeTuning::default(),
        );
        for _ in 0..20 {
            assert_eq!(s.select_kind(), NodeKind::Volatile);
        }
    }

    #[test]
    fn test_kind_falls_through_to_normal() {
        let mut s = NodeSpawner::new(
            DeterministicRandom::new(2),
            SpawnerTuning {
                volatile_chance: 0.0,
                phase_chance: 0.0,
                fake_chance: 1.0,
                ..SpawnerTuning::default()
            },
            NodeTuning::default(),
        );
        assert_eq!(s.select_kind(), NodeKind::Fake);
    }

    #[test]
    fn test_volatile_chain_cascades() {
        let mut s = spawner(3);
        let a = s.insert_node(NodeKind::Volatile, Polarity::Positive, Vec2::new(150.0, 0.0), 50.0);
        let _b = s.insert_node(NodeKind::Volatile, Polarity::Positive, Vec2::new(210.0, 0.0), 20.0);
        let _c = s.insert_node(NodeKind::Normal, Polarity::Negative, Vec2::new(280.0, 0.0), 30.0);
        let far = s.insert_node(NodeKind::Normal, Polarity::Negative, Vec2::new(-200.0, 0.0), 30.0);

        let outcomes = s.explode_node(a);
        let exploded: Vec<u32> = outcomes.iter().map(NodeOutcome::node_id).collect();
        assert_eq!(exploded, vec![1, 2, 3]);
        assert!(!s.get(far).unwrap().is_terminal());

        assert!(s.explode_node(a).is_empty());
        assert_eq!(s.prune_terminal(), 3);
        assert_eq!(s.len(), 1);
        assert_eq!(s.keys(), &[far]);
    }

    #[test]
    fn test_stale_key_after_prune() {
        let mut s = spawner(4);
        let k = s.insert_node(NodeKind::Normal, Polarity::Positive, Vec2::new(150.0, 0.0), 50.0);
        s.explode_node(k);
        s.prune_terminal();
        let _other = s.insert_node(NodeKind::Normal, Polarity::Positive, Vec2::new(150.0, 0.0), 50.0);
        assert!(s.get(k).is_none());
    }
}

//! Beam orchestration
//!
//! One beam can be active (under the player's finger) at a time. Released
//! beams keep living in `released` until they have retracted or faded out.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::beam::{Beam, BeamState};
use super::node::{NodeOutcome, Polarity, Stabilization};
use super::spawner::{NodeKey, NodeSpawner};
use crate::tuning::BeamTuning;

/// Events emitted by beam updates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BeamEvent {
    Locked { beam_id: u32, node: NodeKey, node_id: u32 },
    /// The beam touched a node it does not match
    CausedExplosion { beam_id: u32, node: NodeKey, node_id: u32 },
    /// A retracting beam passed close to a node it does not match
    NearMiss { beam_id: u32, node: NodeKey },
    Stabilized { beam_id: u32, outcome: NodeOutcome },
}

#[derive(Debug, Clone)]
pub struct BeamManager {
    origin: Vec2,
    origin_radius: f32,
    active: Option<Beam>,
    released: Vec<Beam>,
    next_beam_id: u32,
    polarity: Polarity,
    /// Facing of the aim indicator on the core
    aim: Vec2,
    input_enabled: bool,
    lock_scale: f32,
    /// Raised by player commands between updates; drained by the next `update`
    pending: Vec<BeamEvent>,
    tuning: BeamTuning,
}

impl BeamManager {
    pub fn new(origin: Vec2, origin_radius: f32, tuning: BeamTuning) -> Self {
        Self {
            origin,
            origin_radius,
            active: None,
            released: Vec::new(),
            next_beam_id: 1,
            polarity: Polarity::Positive,
            aim: Vec2::X,
            input_enabled: true,
            lock_scale: 1.0,
            pending: Vec::new(),
            tuning,
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn set_polarity(&mut self, polarity: Polarity) {
        self.polarity = polarity;
    }

    pub fn toggle_polarity(&mut self) -> Polarity {
        self.polarity = self.polarity.flipped();
        self.polarity
    }

    pub fn aim(&self) -> Vec2 {
        self.aim
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    /// Chapter margin of error applied to the lock distance
    pub fn set_lock_scale(&mut self, scale: f32) {
        self.lock_scale = scale.max(0.0);
    }

    pub fn lock_distance(&self) -> f32 {
        self.tuning.lock_distance * self.lock_scale
    }

    pub fn active_beam(&self) -> Option<&Beam> {
        self.active.as_ref()
    }

    pub fn has_active_beam(&self) -> bool {
        self.active.is_some()
    }

    /// Beams no longer under the player's control (stabilizing or retracting)
    pub fn released_beams(&self) -> &[Beam] {
        &self.released
    }

    pub fn locked_beams(&self) -> impl Iterator<Item = &Beam> + '_ {
        self.released.iter().filter(|b| b.state() == BeamState::Stabilizing)
    }

    /// Fire a new beam towards `point`
    pub fn shoot_towards(&mut self, point: Vec2) -> bool {
        if !self.input_enabled || self.active.is_some() {
            return false;
        }
        let offset = point - self.origin;
        if offset.length() <= self.origin_radius {
            return false;
        }
        let direction = offset.normalize();
        let start = self.origin + direction * self.origin_radius;

        let mut beam = Beam::new(self.next_beam_id, self.polarity, start, direction, &self.tuning);
        self.next_beam_id += 1;
        if !beam.start_extending(self.tuning.max_length) {
            return false;
        }
        self.aim = direction;
        log::debug!("Beam {} fired at ({:.0}, {:.0})", beam.id, point.x, point.y);
        self.active = Some(beam);
        true
    }

    /// Re-aim the extending beam
    pub fn update_target(&mut self, point: Vec2) -> bool {
        let Some(beam) = self.active.as_mut() else {
            return false;
        };
        if beam.state() != BeamState::Extending {
            return false;
        }
        let offset = point - self.origin;
        if offset.length() <= self.origin_radius {
            return false;
        }
        let direction = offset.normalize();
        if !beam.set_direction(direction) {
            return false;
        }
        beam.origin = self.origin + direction * self.origin_radius;
        self.aim = direction;
        true
    }

    /// Let go of the active beam: locked beams start stabilizing, others retract
    pub fn end_beam(&mut self) -> bool {
        let Some(mut beam) = self.active.take() else {
            return false;
        };
        if beam.state() == BeamState::Locked {
            beam.start_stabilizing();
        } else if beam.start_retracting() {
            self.note_near_miss(&beam);
        }
        self.released.push(beam);
        true
    }

    /// Abort the active beam; a locked node is released back to decay
    pub fn cancel(&mut self, nodes: &mut NodeSpawner) -> bool {
        let Some(mut beam) = self.active.take() else {
            return false;
        };
        if let Some(key) = beam.abort()
            && let Some(node) = nodes.get_mut(key)
        {
            node.stop_stabilizing();
        }
        self.note_near_miss(&beam);
        self.released.push(beam);
        true
    }

    fn note_near_miss(&mut self, beam: &Beam) {
        if let Some(node) = beam.near_miss() {
            self.pending.push(BeamEvent::NearMiss { beam_id: beam.id, node });
        }
    }

    pub fn update(&mut self, dt: f32, nodes: &mut NodeSpawner) -> Vec<BeamEvent> {
        let mut events = std::mem::take(&mut self.pending);

        if let Some(beam) = self.active.as_mut() {
            let was_extending = beam.state() == BeamState::Extending;
            beam.update(dt);
            if beam.state() == BeamState::Extending {
                if let Some(event) = Self::check_beam_node_intersection(
                    beam,
                    nodes,
                    self.tuning.lock_distance * self.lock_scale,
                    self.tuning.near_miss_distance * self.lock_scale,
                ) {
                    events.push(event);
                }
            } else if was_extending
                && beam.state() == BeamState::Retracting
                && let Some(node) = beam.near_miss()
            {
                events.push(BeamEvent::NearMiss { beam_id: beam.id, node });
            }
            if !beam.is_active() {
                self.active = None;
            }
        }

        let rate = self.tuning.stabilization_rate;
        for beam in &mut self.released {
            let was_extending = beam.state() == BeamState::Extending;
            beam.update(dt);
            if was_extending
                && beam.state() == BeamState::Retracting
                && let Some(node) = beam.near_miss()
            {
                events.push(BeamEvent::NearMiss { beam_id: beam.id, node });
            }
            if beam.state() != BeamState::Stabilizing || beam.is_fading() {
                continue;
            }
            let node = beam.connected_node().and_then(|key| nodes.get_mut(key));
            match node {
                Some(node) => {
                    if let Stabilization::Completed(outcome) = node.apply_stabilization(rate * dt) {
                        events.push(BeamEvent::Stabilized {
                            beam_id: beam.id,
                            outcome,
                        });
                        beam.begin_fade();
                    } else if node.is_terminal() {
                        beam.begin_fade();
                    }
                }
                // Node was removed under us (world reset or pruned chain victim)
                None => beam.begin_fade(),
            }
        }
        self.released.retain(Beam::is_active);

        events
    }

    /// Lock test for an extending beam: the first node in spawn order within
    /// lock distance of the tip decides the outcome, even if others overlap.
    fn check_beam_node_intersection(
        beam: &mut Beam,
        nodes: &mut NodeSpawner,
        lock_distance: f32,
        near_miss_distance: f32,
    ) -> Option<BeamEvent> {
        let tip = beam.tip();
        let lock_sq = lock_distance * lock_distance;
        let near_sq = near_miss_distance * near_miss_distance;

        let mut hit = None;
        for (key, node) in nodes.iter() {
            if node.is_terminal() || node.is_stabilizing() {
                continue;
            }
            let distance_sq = node.position.distance_squared(tip);
            if distance_sq <= lock_sq {
                hit = Some((key, node.id, node.matches_polarity(beam.polarity)));
                break;
            }
            if distance_sq <= near_sq && !node.matches_polarity(beam.polarity) {
                beam.record_near_miss(key);
            }
        }

        let (key, node_id, matches) = hit?;
        if matches {
            if !beam.lock_to_node(key) {
                return None;
            }
            if let Some(node) = nodes.get_mut(key) {
                node.start_stabilizing();
            }
            log::debug!("Beam {} locked to node {}", beam.id, node_id);
            Some(BeamEvent::Locked {
                beam_id: beam.id,
                node: key,
                node_id,
            })
        } else {
            // TODO: confirm whether this check should explode the node itself.
            // For now the tick orchestration explodes it on CausedExplosion.
            Some(BeamEvent::CausedExplosion {
                beam_id: beam.id,
                node: key,
                node_id,
            })
        }
    }

    /// Drop every beam (world reset)
    pub fn clear(&mut self) {
        self.active = None;
        self.released.clear();
        self.pending.clear();
    }
}

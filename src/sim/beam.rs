//! The player's stabilization beam
//!
//! inactive -> extending -> locked -> stabilizing -> (fade) -> inactive
//!                       \-> retracting -> inactive

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::machine::{MachineState, StateMachine};
use super::node::Polarity;
use super::spawner::NodeKey;
use crate::tuning::BeamTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamState {
    Inactive,
    Extending,
    Locked,
    Stabilizing,
    Retracting,
}

impl MachineState for BeamState {
    fn can_transition_to(self, next: Self) -> bool {
        use BeamState::*;
        matches!(
            (self, next),
            (Inactive, Extending)
                | (Extending, Locked)
                | (Extending, Retracting)
                | (Locked, Stabilizing)
                | (Stabilizing, Inactive)
                | (Retracting, Inactive)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    pub id: u32,
    pub polarity: Polarity,
    /// Anchor point on the core rim
    pub origin: Vec2,
    direction: Vec2,
    current_length: f32,
    target_length: f32,
    max_length: f32,
    extension_speed: f32,
    machine: StateMachine<BeamState>,
    connected_node: Option<NodeKey>,
    /// Closest wrong-polarity node the tip passed near while extending
    near_miss: Option<NodeKey>,
    alpha: f32,
    fade_remaining: Option<f32>,
    fade_duration: f32,
    is_active: bool,
}

impl Beam {
    pub fn new(id: u32, polarity: Polarity, origin: Vec2, direction: Vec2, tuning: &BeamTuning) -> Self {
        Self {
            id,
            polarity,
            origin,
            direction: direction.normalize_or_zero(),
            current_length: 0.0,
            target_length: tuning.max_length,
            max_length: tuning.max_length,
            extension_speed: tuning.extension_speed,
            machine: StateMachine::new(BeamState::Inactive),
            connected_node: None,
            near_miss: None,
            alpha: 1.0,
            fade_remaining: None,
            fade_duration: tuning.fade_duration,
            is_active: true,
        }
    }

    #[inline]
    pub fn state(&self) -> BeamState {
        self.machine.current()
    }

    pub fn time_in_state(&self) -> f32 {
        self.machine.time_in_state()
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn current_length(&self) -> f32 {
        self.current_length
    }

    pub fn target_length(&self) -> f32 {
        self.target_length
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// False once retracted to zero or faded out; the owner drops it then
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn connected_node(&self) -> Option<NodeKey> {
        self.connected_node
    }

    pub fn near_miss(&self) -> Option<NodeKey> {
        self.near_miss
    }

    pub fn record_near_miss(&mut self, node: NodeKey) {
        if self.near_miss.is_none() {
            self.near_miss = Some(node);
        }
    }

    pub fn is_fading(&self) -> bool {
        self.fade_remaining.is_some()
    }

    /// Beam tip in world space
    pub fn tip(&self) -> Vec2 {
        self.origin + self.direction * self.current_length
    }

    pub fn start_extending(&mut self, target_length: f32) -> bool {
        if self.machine.transition(BeamState::Extending).is_err() {
            return false;
        }
        self.target_length = target_length.clamp(0.0, self.max_length);
        self.current_length = 0.0;
        true
    }

    /// Re-aim; only honoured while extending
    pub fn set_direction(&mut self, direction: Vec2) -> bool {
        if !self.machine.is(BeamState::Extending) {
            return false;
        }
        let direction = direction.normalize_or_zero();
        if direction == Vec2::ZERO {
            return false;
        }
        self.direction = direction;
        true
    }

    /// Attach to a node; the beam length freezes at the current tip
    pub fn lock_to_node(&mut self, node: NodeKey) -> bool {
        if self.connected_node.is_some() || self.machine.transition(BeamState::Locked).is_err() {
            return false;
        }
        self.connected_node = Some(node);
        true
    }

    /// Called once the beam is handed off after locking
    pub fn start_stabilizing(&mut self) {
        self.machine.force(BeamState::Stabilizing);
    }

    pub fn start_retracting(&mut self) -> bool {
        self.machine.transition(BeamState::Retracting).is_ok()
    }

    /// Release the connected node and pull back, whatever the current state
    pub fn abort(&mut self) -> Option<NodeKey> {
        let node = self.connected_node.take();
        self.fade_remaining = None;
        self.machine.force(BeamState::Retracting);
        node
    }

    /// Fade out after a completed stabilization
    pub fn begin_fade(&mut self) {
        if self.fade_remaining.is_none() {
            self.fade_remaining = Some(self.fade_duration);
        }
    }

    pub fn update(&mut self, dt: f32) {
        if !self.is_active {
            return;
        }
        self.machine.update(dt);

        match self.state() {
            BeamState::Extending => {
                self.current_length = (self.current_length + self.extension_speed * dt).min(self.target_length);
                if self.current_length >= self.max_length {
                    self.start_retracting();
                }
            }
            BeamState::Retracting => {
                self.current_length = (self.current_length - 2.0 * self.extension_speed * dt).max(0.0);
                if self.current_length <= 0.0 {
                    self.finish();
                }
            }
            BeamState::Stabilizing => {
                let pulse = (self.machine.time_in_state() * 8.0).sin() * 0.3;
                match self.fade_remaining.as_mut() {
                    Some(remaining) => {
                        *remaining -= dt;
                        let t = if self.fade_duration > 0.0 {
                            (*remaining / self.fade_duration).max(0.0)
                        } else {
                            0.0
                        };
                        self.alpha = t;
                        if *remaining <= 0.0 {
                            self.finish();
                        }
                    }
                    None => self.alpha = 0.7 + pulse,
                }
            }
            BeamState::Locked | BeamState::Inactive => {}
        }
    }

    fn finish(&mut self) {
        self.connected_node = None;
        self.current_length = 0.0;
        self.alpha = 0.0;
        self.fade_remaining = None;
        self.machine.force(BeamState::Inactive);
        self.is_active = false;
    }
}

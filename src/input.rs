//! Input interpretation
//!
//! Pointer phases map onto beam commands; a horizontal drag spins the core
//! like a joystick, with momentum after release.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::normalize_angle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

/// One touch/pointer sample in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Vec2,
}

impl PointerEvent {
    pub fn began(position: Vec2) -> Self {
        Self {
            phase: PointerPhase::Began,
            position,
        }
    }

    pub fn moved(position: Vec2) -> Self {
        Self {
            phase: PointerPhase::Moved,
            position,
        }
    }

    pub fn ended(position: Vec2) -> Self {
        Self {
            phase: PointerPhase::Ended,
            position,
        }
    }

    pub fn cancelled(position: Vec2) -> Self {
        Self {
            phase: PointerPhase::Cancelled,
            position,
        }
    }
}

/// Drag-to-rotate with momentum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationControl {
    /// Core facing (radians)
    pub angle: f32,
    pub angular_velocity: f32,
    dragging: bool,
    /// Radians of rotation per pixel of horizontal drag
    pub sensitivity: f32,
    pub max_angular_velocity: f32,
    /// Per-tick velocity retention after release
    pub damping: f32,
}

impl Default for RotationControl {
    fn default() -> Self {
        Self {
            angle: 0.0,
            angular_velocity: 0.0,
            dragging: false,
            sensitivity: 0.01,
            max_angular_velocity: 8.0,
            damping: 0.9,
        }
    }
}

impl RotationControl {
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Horizontal drag delta (pixels) accumulated this tick
    pub fn drag(&mut self, delta_x: f32, dt: f32) {
        self.dragging = true;
        if dt <= 0.0 {
            return;
        }
        self.angular_velocity = (delta_x * self.sensitivity / dt)
            .clamp(-self.max_angular_velocity, self.max_angular_velocity);
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    pub fn update(&mut self, dt: f32) {
        self.angle = normalize_angle(self.angle + self.angular_velocity * dt);
        if !self.dragging {
            self.angular_velocity *= self.damping;
            if self.angular_velocity.abs() < 0.01 {
                self.angular_velocity = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_sets_clamped_velocity() {
        let mut r = RotationControl::default();
        r.drag(10.0, 0.1);
        assert!((r.angular_velocity - 1.0).abs() < 1e-5);
        r.drag(10_000.0, 0.1);
        assert_eq!(r.angular_velocity, 8.0);
        r.drag(-10_000.0, 0.1);
        assert_eq!(r.angular_velocity, -8.0);
    }

    #[test]
    fn test_momentum_decays_after_release() {
        let mut r = RotationControl::default();
        r.drag(10.0, 0.1);
        r.update(0.1);
        assert!((r.angle - 0.1).abs() < 1e-5);
        assert!((r.angular_velocity - 1.0).abs() < 1e-5);

        r.release();
        r.update(0.1);
        assert!((r.angular_velocity - 0.9).abs() < 1e-5);
        for _ in 0..100 {
            r.update(0.1);
        }
        assert_eq!(r.angular_velocity, 0.0);
        let settled = r.angle;
        r.update(0.1);
        assert_eq!(r.angle, settled);
    }
}

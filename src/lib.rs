//! Stability Defense - simulation core for a core-stability arcade game
//! with a tower-defense layer
//!
//! Core modules:
//! - `sim`: Deterministic core-stability simulation (nodes, beams, chaos, chapters)
//! - `defense`: Deterministic tower-defense simulation (waves, enemies, projectiles)
//! - `driver`: Fixed-step driver that advances both and fans events out
//! - `input`: Pointer and rotation-drag interpretation
//! - `persistence`: Key-value progress store and wallet
//! - `tuning`: Data-driven game balance
//! - `telemetry`: Fire-and-forget analytics sink

pub mod defense;
pub mod driver;
pub mod input;
pub mod persistence;
pub mod sim;
pub mod telemetry;
pub mod tuning;

pub use driver::{GameEvent, Simulation};
pub use tuning::Tuning;

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta accepted by the driver
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// The player core sits at the origin and never moves, only rotates
    pub const CORE_RADIUS: f32 = 40.0;

    /// Tower-defense tower footprint
    pub const TOWER_RADIUS: f32 = 30.0;

    /// Support turret footprint
    pub const TURRET_RADIUS: f32 = 12.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Shortest signed angular difference from `from` to `to`
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(-3.5 * PI) - (0.5 * PI)).abs() < 1e-5);
        assert_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_polar_to_cartesian() {
        let p = polar_to_cartesian(150.0, PI / 2.0);
        assert!(p.x.abs() < 1e-3);
        assert!((p.y - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_angle_delta_takes_short_way() {
        let d = angle_delta(PI - 0.1, -PI + 0.1);
        assert!((d - 0.2).abs() < 1e-4);
    }
}

//! Central tower
//!
//! The tower re-acquires the nearest enemy in range every tick; there is no
//! target memory, so equidistant enemies can swap back and forth.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy_spawner::{EnemyKey, EnemySpawner};
use super::projectile::{ProjectileOwner, Shot};
use crate::tuning::TowerTuning;
use crate::{angle_delta, normalize_angle};

/// Defense reduction shared by the tower and its turrets
pub fn mitigate(raw: f32, defense: f32) -> f32 {
    raw * 100.0 / (100.0 + defense.max(0.0))
}

/// Nearest living enemy within `range` of `from`; ties go to the earlier spawn
pub fn nearest_enemy_in_range(enemies: &EnemySpawner, from: Vec2, range: f32) -> Option<EnemyKey> {
    let range_sq = range * range;
    let mut best: Option<(EnemyKey, f32)> = None;
    for (key, enemy) in enemies.iter() {
        if !enemy.is_alive() {
            continue;
        }
        let d = enemy.position.distance_squared(from);
        if d > range_sq {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((key, d));
        }
    }
    best.map(|(key, _)| key)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerNode {
    pub position: Vec2,
    pub damage: f32,
    pub fire_rate: f32,
    pub range: f32,
    pub max_hp: f32,
    hp: f32,
    pub defense: f32,
    pub projectile_speed: f32,
    pub penetration: u32,
    /// Barrel facing (radians)
    pub rotation: f32,
    pub rotation_smoothing: f32,
    cooldown: f32,
    #[serde(skip)]
    target: Option<EnemyKey>,
}

impl TowerNode {
    pub fn new(position: Vec2, tuning: &TowerTuning) -> Self {
        Self {
            position,
            damage: tuning.damage,
            fire_rate: tuning.fire_rate,
            range: tuning.range,
            max_hp: tuning.max_hp,
            hp: tuning.max_hp,
            defense: tuning.defense,
            projectile_speed: tuning.projectile_speed,
            penetration: tuning.penetration,
            rotation: 0.0,
            rotation_smoothing: tuning.rotation_smoothing,
            cooldown: 0.0,
            target: None,
        }
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn target(&self) -> Option<EnemyKey> {
        self.target
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0.0
    }

    /// Damage after defense: `raw * 100 / (100 + defense)`
    pub fn mitigate(&self, raw: f32) -> f32 {
        mitigate(raw, self.defense)
    }

    /// Returns the damage actually taken
    pub fn take_damage(&mut self, raw: f32) -> f32 {
        if self.is_destroyed() || raw <= 0.0 {
            return 0.0;
        }
        let taken = self.mitigate(raw).min(self.hp);
        self.hp -= taken;
        taken
    }

    pub fn repair(&mut self) {
        self.hp = self.max_hp;
        self.cooldown = 0.0;
        self.target = None;
    }

    /// Re-target, turn towards the target and fire when the cooldown allows
    pub fn update(&mut self, dt: f32, enemies: &EnemySpawner) -> Option<Shot> {
        self.cooldown = (self.cooldown - dt).max(0.0);
        if self.is_destroyed() {
            self.target = None;
            return None;
        }

        self.target = nearest_enemy_in_range(enemies, self.position, self.range);
        let target = enemies.get(self.target?)?;
        let offset = target.position - self.position;
        let desired = offset.y.atan2(offset.x);
        self.rotation = normalize_angle(self.rotation + angle_delta(self.rotation, desired) * self.rotation_smoothing);

        if self.cooldown > 0.0 || self.fire_rate <= 0.0 {
            return None;
        }
        self.cooldown = 1.0 / self.fire_rate;
        Some(Shot {
            owner: ProjectileOwner::Player,
            origin: self.position,
            direction: offset.normalize_or(Vec2::X),
            speed: self.projectile_speed,
            damage: self.damage,
            penetration: self.penetration,
            explosion_radius: 0.0,
            slow: None,
        })
    }
}

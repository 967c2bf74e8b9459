//! Support turrets orbiting the tower

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy_spawner::{EnemyKey, EnemySpawner};
use super::projectile::{ProjectileOwner, Shot, SlowEffect};
use super::tower::{mitigate, nearest_enemy_in_range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurretKind {
    /// Fast, light shots
    Blaster,
    /// Slows what it hits
    Frost,
    /// Slow shells with splash damage
    Mortar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurretProfile {
    pub damage: f32,
    pub fire_rate: f32,
    pub range: f32,
    pub projectile_speed: f32,
    pub explosion_radius: f32,
    pub slow: Option<SlowEffect>,
    pub max_hp: f32,
    pub defense: f32,
}

impl TurretKind {
    pub const fn profile(self) -> TurretProfile {
        match self {
            TurretKind::Blaster => TurretProfile {
                damage: 6.0,
                fire_rate: 3.0,
                range: 180.0,
                projectile_speed: 520.0,
                explosion_radius: 0.0,
                slow: None,
                max_hp: 80.0,
                defense: 5.0,
            },
            TurretKind::Frost => TurretProfile {
                damage: 3.0,
                fire_rate: 1.5,
                range: 160.0,
                projectile_speed: 420.0,
                explosion_radius: 0.0,
                slow: Some(SlowEffect {
                    multiplier: 0.5,
                    duration: 2.0,
                }),
                max_hp: 70.0,
                defense: 5.0,
            },
            TurretKind::Mortar => TurretProfile {
                damage: 10.0,
                fire_rate: 0.5,
                range: 240.0,
                projectile_speed: 300.0,
                explosion_radius: 50.0,
                slow: None,
                max_hp: 100.0,
                defense: 8.0,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurretKind::Blaster => "blaster",
            TurretKind::Frost => "frost",
            TurretKind::Mortar => "mortar",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurretNode {
    pub kind: TurretKind,
    pub position: Vec2,
    /// Scales profile damage (tower upgrades)
    pub damage_multiplier: f32,
    pub max_hp: f32,
    hp: f32,
    pub defense: f32,
    cooldown: f32,
    #[serde(skip)]
    target: Option<EnemyKey>,
}

impl TurretNode {
    pub fn new(kind: TurretKind, position: Vec2) -> Self {
        let p = kind.profile();
        Self {
            kind,
            position,
            damage_multiplier: 1.0,
            max_hp: p.max_hp,
            hp: p.max_hp,
            defense: p.defense,
            cooldown: 0.0,
            target: None,
        }
    }

    pub fn target(&self) -> Option<EnemyKey> {
        self.target
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0.0
    }

    /// Returns the damage actually taken after defense
    pub fn take_damage(&mut self, raw: f32) -> f32 {
        if self.is_destroyed() || raw <= 0.0 {
            return 0.0;
        }
        let taken = mitigate(raw, self.defense).min(self.hp);
        self.hp -= taken;
        taken
    }

    /// Full repair, ready to fire
    pub fn reset(&mut self) {
        self.hp = self.max_hp;
        self.cooldown = 0.0;
        self.target = None;
    }

    /// Destroyed turrets stay silent until the next `reset`
    pub fn update(&mut self, dt: f32, enemies: &EnemySpawner) -> Option<Shot> {
        if self.is_destroyed() {
            self.target = None;
            return None;
        }
        let p = self.kind.profile();
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.target = nearest_enemy_in_range(enemies, self.position, p.range);
        let target = enemies.get(self.target?)?;
        if self.cooldown > 0.0 {
            return None;
        }
        self.cooldown = 1.0 / p.fire_rate;
        Some(Shot {
            owner: ProjectileOwner::Player,
            origin: self.position,
            direction: (target.position - self.position).normalize_or(Vec2::X),
            speed: p.projectile_speed,
            damage: p.damage * self.damage_multiplier,
            penetration: 1,
            explosion_radius: p.explosion_radius,
            slow: p.slow,
        })
    }
}

//! Enemy entities
//!
//! Enemies are pooled. `setup` re-initialises every field so a recycled enemy
//! never carries state from its previous life, and `die` hands back what the
//! caller needs to resolve the death (including whether it splits) instead of
//! leaving it to read flags afterwards.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::wave::WaveStats;
use crate::sim::pool::Poolable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Grunt,
    Runner,
    Brute,
    Archer,
    Shielder,
    Splitter,
    Splitling,
    Swarmer,
    Bomber,
    MiniBoss,
    Boss,
}

/// Per-kind multipliers and geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyProfile {
    pub hp: f32,
    /// Multiplier on the wave speed
    pub speed: f32,
    pub damage: f32,
    pub size: f32,
    /// 0 for melee
    pub attack_range: f32,
    pub coins: f32,
    /// 0xRRGGBB
    pub color: u32,
}

const fn profile(hp: f32, speed: f32, damage: f32, size: f32, attack_range: f32, coins: f32, color: u32) -> EnemyProfile {
    EnemyProfile {
        hp,
        speed,
        damage,
        size,
        attack_range,
        coins,
        color,
    }
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 11] = [
        EnemyKind::Grunt,
        EnemyKind::Runner,
        EnemyKind::Brute,
        EnemyKind::Archer,
        EnemyKind::Shielder,
        EnemyKind::Splitter,
        EnemyKind::Splitling,
        EnemyKind::Swarmer,
        EnemyKind::Bomber,
        EnemyKind::MiniBoss,
        EnemyKind::Boss,
    ];

    pub const fn profile(self) -> EnemyProfile {
        match self {
            EnemyKind::Grunt => profile(1.0, 1.0, 1.0, 12.0, 0.0, 1.0, 0xd04848),
            EnemyKind::Runner => profile(0.6, 1.7, 0.7, 9.0, 0.0, 0.8, 0xf0a030),
            EnemyKind::Brute => profile(2.8, 0.6, 1.6, 18.0, 0.0, 2.0, 0x8a3a2a),
            EnemyKind::Archer => profile(0.9, 0.9, 1.2, 11.0, 160.0, 1.5, 0x4cae4c),
            EnemyKind::Shielder => profile(1.6, 0.8, 1.0, 14.0, 0.0, 1.8, 0x5080d0),
            EnemyKind::Splitter => profile(1.4, 0.9, 1.0, 15.0, 0.0, 1.5, 0xa050c0),
            EnemyKind::Splitling => profile(0.35, 1.3, 0.5, 7.0, 0.0, 0.3, 0xc890e0),
            EnemyKind::Swarmer => profile(0.4, 1.4, 0.4, 7.0, 0.0, 0.4, 0xe0e040),
            EnemyKind::Bomber => profile(1.2, 1.1, 2.5, 13.0, 0.0, 1.6, 0xff6020),
            EnemyKind::MiniBoss => profile(8.0, 0.7, 2.5, 26.0, 120.0, 10.0, 0xb02060),
            EnemyKind::Boss => profile(25.0, 0.5, 4.0, 36.0, 180.0, 30.0, 0x600000),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Grunt => "grunt",
            EnemyKind::Runner => "runner",
            EnemyKind::Brute => "brute",
            EnemyKind::Archer => "archer",
            EnemyKind::Shielder => "shielder",
            EnemyKind::Splitter => "splitter",
            EnemyKind::Splitling => "splitling",
            EnemyKind::Swarmer => "swarmer",
            EnemyKind::Bomber => "bomber",
            EnemyKind::MiniBoss => "mini_boss",
            EnemyKind::Boss => "boss",
        }
    }

    pub fn is_ranged(self) -> bool {
        self.profile().attack_range > 0.0
    }

    pub fn is_boss(self) -> bool {
        matches!(self, EnemyKind::MiniBoss | EnemyKind::Boss)
    }

    pub fn splits_on_death(self) -> bool {
        self == EnemyKind::Splitter
    }

    /// Fraction of incoming damage actually taken
    pub fn damage_taken_multiplier(self) -> f32 {
        match self {
            EnemyKind::Shielder => 0.5,
            _ => 1.0,
        }
    }
}

/// What an enemy did when its attack came off cooldown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyAttack {
    Melee { damage: f32 },
    /// Fire a projectile from `origin` along `direction`
    Ranged { origin: Vec2, direction: Vec2, damage: f32 },
}

/// Everything the caller needs to resolve a death
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathDetail {
    pub id: u32,
    pub kind: EnemyKind,
    pub position: Vec2,
    pub coin_value: u32,
    pub should_split: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub position: Vec2,
    pub target_position: Vec2,
    hp: f32,
    max_hp: f32,
    pub move_speed: f32,
    pub damage: f32,
    pub coin_value: u32,
    pub size: f32,
    pub attack_range: f32,
    attack_cooldown: f32,
    slow_multiplier: f32,
    slow_remaining: f32,
    attacking: bool,
    dead: bool,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            id: 0,
            kind: EnemyKind::Grunt,
            position: Vec2::ZERO,
            target_position: Vec2::ZERO,
            hp: 0.0,
            max_hp: 0.0,
            move_speed: 0.0,
            damage: 0.0,
            coin_value: 0,
            size: 0.0,
            attack_range: 0.0,
            attack_cooldown: 0.0,
            slow_multiplier: 1.0,
            slow_remaining: 0.0,
            attacking: false,
            dead: true,
        }
    }
}

impl Poolable for Enemy {
    fn reset(&mut self) {
        self.attack_cooldown = 0.0;
        self.slow_multiplier = 1.0;
        self.slow_remaining = 0.0;
        self.attacking = false;
        self.dead = true;
    }
}

impl Enemy {
    /// Re-initialise every field for a fresh life
    pub fn setup(&mut self, id: u32, kind: EnemyKind, position: Vec2, target: Vec2, stats: &WaveStats) {
        let p = kind.profile();
        self.id = id;
        self.kind = kind;
        self.position = position;
        self.target_position = target;
        self.max_hp = (stats.hp * p.hp).max(1.0);
        self.hp = self.max_hp;
        self.move_speed = stats.speed * p.speed;
        self.damage = stats.damage * p.damage;
        self.coin_value = ((stats.coin_value as f32 * p.coins).round() as u32).max(1);
        self.size = p.size;
        self.attack_range = p.attack_range;
        self.attack_cooldown = 0.0;
        self.slow_multiplier = 1.0;
        self.slow_remaining = 0.0;
        self.attacking = false;
        self.dead = false;
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Still a valid target
    pub fn is_alive(&self) -> bool {
        !self.dead && self.hp > 0.0
    }

    /// Out of HP but `die` not called yet
    pub fn is_dying(&self) -> bool {
        !self.dead && self.hp <= 0.0
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn is_slowed(&self) -> bool {
        self.slow_remaining > 0.0
    }

    pub fn current_speed(&self) -> f32 {
        if self.is_slowed() {
            self.move_speed * self.slow_multiplier
        } else {
            self.move_speed
        }
    }

    /// Distance from the target at which the enemy stops and attacks
    pub fn engage_distance(&self, target_radius: f32) -> f32 {
        if self.attack_range > 0.0 {
            self.attack_range
        } else {
            target_radius + self.size
        }
    }

    /// Walk towards the target or attack it once in range
    pub fn update(&mut self, dt: f32, target_radius: f32, attack_interval: f32) -> Option<EnemyAttack> {
        if !self.is_alive() {
            return None;
        }

        if self.slow_remaining > 0.0 {
            self.slow_remaining = (self.slow_remaining - dt).max(0.0);
        }

        let to_target = self.target_position - self.position;
        let distance = to_target.length();
        let engage = self.engage_distance(target_radius);

        if distance > engage {
            self.attacking = false;
            let step = (self.current_speed() * dt).min(distance - engage);
            self.position += to_target / distance * step;
            return None;
        }

        self.attacking = true;
        self.attack_cooldown -= dt;
        if self.attack_cooldown > 0.0 {
            return None;
        }
        self.attack_cooldown = attack_interval;

        if self.attack_range > 0.0 {
            let direction = if distance > 0.0 { to_target / distance } else { Vec2::X };
            Some(EnemyAttack::Ranged {
                origin: self.position,
                direction,
                damage: self.damage,
            })
        } else {
            Some(EnemyAttack::Melee { damage: self.damage })
        }
    }

    /// Apply mitigated damage; returns the amount actually taken
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if !self.is_alive() || amount <= 0.0 {
            return 0.0;
        }
        let taken = (amount * self.kind.damage_taken_multiplier()).min(self.hp);
        self.hp -= taken;
        taken
    }

    pub fn heal(&mut self, amount: f32) {
        if self.dead || amount <= 0.0 {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Keeps the stronger slow and the longer duration
    pub fn apply_slow(&mut self, multiplier: f32, duration: f32) {
        if !self.is_alive() {
            return;
        }
        let multiplier = multiplier.clamp(0.0, 1.0);
        if self.is_slowed() {
            self.slow_multiplier = self.slow_multiplier.min(multiplier);
        } else {
            self.slow_multiplier = multiplier;
        }
        self.slow_remaining = self.slow_remaining.max(duration);
    }

    /// Mark dead exactly once
    pub fn die(&mut self) -> Option<DeathDetail> {
        if self.dead {
            return None;
        }
        self.dead = true;
        self.hp = 0.0;
        self.attacking = false;
        Some(DeathDetail {
            id: self.id,
            kind: self.kind,
            position: self.position,
            coin_value: self.coin_value,
            should_split: self.kind.splits_on_death(),
        })
    }
}

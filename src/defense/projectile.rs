//! Projectiles
//!
//! A projectile remembers everything it has hit, so no target is damaged twice
//! by the same projectile regardless of the order collisions are checked in.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy_spawner::EnemyKey;
use crate::sim::pool::Poolable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileOwner {
    /// Fired by the tower or a turret; hits enemies
    Player,
    /// Fired by a ranged enemy; hits the tower
    Enemy,
}

/// Something a projectile can hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTarget {
    Enemy(EnemyKey),
    Tower,
    /// Index into the defense state's turret list
    Turret(usize),
}

/// Slow effect carried by frost shots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowEffect {
    pub multiplier: f32,
    pub duration: f32,
}

/// A request to launch a projectile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub owner: ProjectileOwner,
    pub origin: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub penetration: u32,
    pub explosion_radius: f32,
    pub slow: Option<SlowEffect>,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub owner: ProjectileOwner,
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    /// Hits left before the projectile is spent
    pub penetration: u32,
    pub explosion_radius: f32,
    pub slow: Option<SlowEffect>,
    traveled: f32,
    max_distance: f32,
    active: bool,
    hit_targets: HashSet<HitTarget>,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            owner: ProjectileOwner::Player,
            position: Vec2::ZERO,
            direction: Vec2::X,
            speed: 0.0,
            damage: 0.0,
            penetration: 1,
            explosion_radius: 0.0,
            slow: None,
            traveled: 0.0,
            max_distance: 0.0,
            active: false,
            hit_targets: HashSet::new(),
        }
    }
}

impl Poolable for Projectile {
    fn reset(&mut self) {
        self.active = false;
        self.traveled = 0.0;
        self.slow = None;
        self.hit_targets.clear();
    }
}

impl Projectile {
    pub fn launch(&mut self, shot: &Shot, max_distance: f32) {
        self.owner = shot.owner;
        self.position = shot.origin;
        self.direction = shot.direction.normalize_or(Vec2::X);
        self.speed = shot.speed;
        self.damage = shot.damage;
        self.penetration = shot.penetration.max(1);
        self.explosion_radius = shot.explosion_radius;
        self.slow = shot.slow;
        self.traveled = 0.0;
        self.max_distance = max_distance;
        self.active = true;
        self.hit_targets.clear();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn traveled(&self) -> f32 {
        self.traveled
    }

    pub fn has_hit(&self, target: HitTarget) -> bool {
        self.hit_targets.contains(&target)
    }

    pub fn hit_count(&self) -> usize {
        self.hit_targets.len()
    }

    /// Move along the heading; expires after `max_distance`
    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        let step = self.speed * dt;
        self.position += self.direction * step;
        self.traveled += step;
        if self.traveled >= self.max_distance {
            self.active = false;
        }
    }

    /// Record a direct hit. Returns false if the target was already hit or
    /// the projectile is spent; otherwise consumes one penetration.
    pub fn register_hit(&mut self, target: HitTarget) -> bool {
        if !self.active || !self.hit_targets.insert(target) {
            return false;
        }
        self.penetration = self.penetration.saturating_sub(1);
        if self.penetration == 0 {
            self.active = false;
        }
        true
    }

    /// Record splash damage without consuming penetration
    pub fn register_splash(&mut self, target: HitTarget) -> bool {
        self.hit_targets.insert(target)
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn shot(penetration: u32) -> Shot {
        Shot {
            owner: ProjectileOwner::Player,
            origin: Vec2::ZERO,
            direction: Vec2::new(2.0, 0.0),
            speed: 100.0,
            damage: 5.0,
            penetration,
            explosion_radius: 0.0,
            slow: None,
        }
    }

    #[test]
    fn test_travels_until_max_distance() {
        let mut p = Projectile::default();
        p.launch(&shot(1), 50.0);
        p.update(0.25);
        assert_eq!(p.position, Vec2::new(25.0, 0.0));
        assert!(p.is_active());
        p.update(0.25);
        assert!(!p.is_active());
        assert_eq!(p.traveled(), 50.0);
    }

    #[test]
    fn test_penetration_and_dedup() {
        let mut keys: SlotMap<EnemyKey, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let b = keys.insert(());

        let mut p = Projectile::default();
        p.launch(&shot(2), 500.0);
        assert!(p.register_hit(HitTarget::Enemy(a)));
        assert!(!p.register_hit(HitTarget::Enemy(a)));
        assert!(p.is_active());
        assert!(p.register_hit(HitTarget::Enemy(b)));
        assert!(!p.is_active());
        assert!(!p.register_hit(HitTarget::Tower));
    }

    #[test]
    fn test_reset_clears_hits() {
        let mut p = Projectile::default();
        p.launch(&shot(3), 500.0);
        p.register_hit(HitTarget::Tower);
        p.reset();
        assert_eq!(p.hit_count(), 0);
        assert!(!p.is_active());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_each_target_hit_at_most_once(hits in proptest::collection::vec(0usize..6, 0..60), penetration in 1u32..10) {
                let mut keys: SlotMap<EnemyKey, ()> = SlotMap::with_key();
                let targets: Vec<EnemyKey> = (0..6).map(|_| keys.insert(())).collect();
                let mut p = Projectile::default();
                p.launch(&shot(penetration), 1000.0);
                let mut accepted = [0u32; 6];
                for i in hits {
                    if p.register_hit(HitTarget::Enemy(targets[i])) {
                        accepted[i] += 1;
                    }
                }
                prop_assert!(accepted.iter().all(|&n| n <= 1));
                prop_assert!(accepted.iter().sum::<u32>() <= penetration);
            }
        }
    }
}

//! Projectile flight and collision
//!
//! Each active projectile checks its opposing side once per tick and takes
//! the first target in range (squared-distance test). Splash and slow are
//! applied at the moment of the direct hit. Enemy shots strike any turret
//! they cross before reaching the tower.

use glam::Vec2;

use super::enemy_spawner::{EnemyKey, EnemySpawner};
use super::projectile::{HitTarget, Projectile, ProjectileOwner, Shot};
use super::tower::TowerNode;
use super::turret::TurretNode;
use crate::consts::{TOWER_RADIUS, TURRET_RADIUS};
use crate::sim::pool::{EntityPool, PoolError};

/// Damage dealt by a projectile this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileHit {
    Enemy { key: EnemyKey, damage: f32 },
    Tower { damage: f32 },
    Turret { index: usize, damage: f32 },
}

#[derive(Debug)]
pub struct ProjectileManager {
    pool: EntityPool<Projectile>,
    active: Vec<Projectile>,
    radius: f32,
    player_range: f32,
    enemy_range: f32,
}

impl ProjectileManager {
    pub fn new(pool: EntityPool<Projectile>, radius: f32, player_range: f32, enemy_range: f32) -> Self {
        Self {
            pool,
            active: Vec::new(),
            radius,
            player_range,
            enemy_range,
        }
    }

    pub fn active(&self) -> &[Projectile] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn pool(&self) -> &EntityPool<Projectile> {
        &self.pool
    }

    pub fn fire(&mut self, shot: &Shot) -> Result<(), PoolError> {
        let mut projectile = self.pool.get()?;
        let range = match shot.owner {
            ProjectileOwner::Player => self.player_range,
            ProjectileOwner::Enemy => self.enemy_range,
        };
        projectile.launch(shot, range);
        self.active.push(projectile);
        Ok(())
    }

    /// Move every projectile, resolve hits, and recycle spent ones
    pub fn update(
        &mut self,
        dt: f32,
        enemies: &mut EnemySpawner,
        tower: &mut TowerNode,
        turrets: &mut [TurretNode],
    ) -> Vec<ProjectileHit> {
        let mut hits = Vec::new();
        for projectile in &mut self.active {
            projectile.update(dt);
            if !projectile.is_active() {
                continue;
            }
            match projectile.owner {
                ProjectileOwner::Player => Self::hit_enemies(projectile, self.radius, enemies, &mut hits),
                ProjectileOwner::Enemy => {
                    if !Self::hit_turrets(projectile, self.radius, turrets, &mut hits) {
                        Self::hit_tower(projectile, self.radius, tower, &mut hits);
                    }
                }
            }
        }

        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].is_active() {
                i += 1;
            } else {
                let spent = self.active.swap_remove(i);
                self.pool.return_to_pool(spent);
            }
        }
        hits
    }

    fn hit_enemies(projectile: &mut Projectile, radius: f32, enemies: &mut EnemySpawner, hits: &mut Vec<ProjectileHit>) {
        let struck = enemies.iter().find_map(|(key, enemy)| {
            if !enemy.is_alive() || projectile.has_hit(HitTarget::Enemy(key)) {
                return None;
            }
            let reach = radius + enemy.size;
            (enemy.position.distance_squared(projectile.position) <= reach * reach).then_some((key, enemy.position))
        });
        let Some((key, impact)) = struck else {
            return;
        };
        if !projectile.register_hit(HitTarget::Enemy(key)) {
            return;
        }
        Self::damage_enemy(projectile, key, enemies, hits);

        if projectile.explosion_radius > 0.0 {
            let splash: Vec<EnemyKey> = enemies
                .iter()
                .filter(|(other, enemy)| {
                    *other != key
                        && enemy.is_alive()
                        && enemy.position.distance_squared(impact) <= projectile.explosion_radius * projectile.explosion_radius
                })
                .map(|(other, _)| other)
                .collect();
            for other in splash {
                if projectile.register_splash(HitTarget::Enemy(other)) {
                    Self::damage_enemy(projectile, other, enemies, hits);
                }
            }
        }
    }

    fn damage_enemy(projectile: &Projectile, key: EnemyKey, enemies: &mut EnemySpawner, hits: &mut Vec<ProjectileHit>) {
        let Some(enemy) = enemies.get_mut(key) else {
            return;
        };
        let damage = enemy.take_damage(projectile.damage);
        if let Some(slow) = projectile.slow {
            enemy.apply_slow(slow.multiplier, slow.duration);
        }
        hits.push(ProjectileHit::Enemy { key, damage });
    }

    fn hit_turrets(
        projectile: &mut Projectile,
        radius: f32,
        turrets: &mut [TurretNode],
        hits: &mut Vec<ProjectileHit>,
    ) -> bool {
        let reach = radius + TURRET_RADIUS;
        let struck = turrets.iter().position(|turret| {
            !turret.is_destroyed() && turret.position.distance_squared(projectile.position) <= reach * reach
        });
        let Some(index) = struck else {
            return false;
        };
        if !projectile.register_hit(HitTarget::Turret(index)) {
            return false;
        }
        let damage = turrets[index].take_damage(projectile.damage);
        hits.push(ProjectileHit::Turret { index, damage });
        true
    }

    fn hit_tower(projectile: &mut Projectile, radius: f32, tower: &mut TowerNode, hits: &mut Vec<ProjectileHit>) {
        if tower.is_destroyed() {
            return;
        }
        let reach = radius + TOWER_RADIUS;
        if tower.position.distance_squared(projectile.position) > reach * reach {
            return;
        }
        if projectile.register_hit(HitTarget::Tower) {
            let damage = tower.take_damage(projectile.damage);
            hits.push(ProjectileHit::Tower { damage });
        }
    }

    /// Recycle everything in flight
    pub fn clear(&mut self) {
        for projectile in self.active.drain(..) {
            self.pool.return_to_pool(projectile);
        }
    }

    /// Positions of live projectiles, for presentation
    pub fn positions(&self) -> impl Iterator<Item = (ProjectileOwner, Vec2)> + '_ {
        self.active.iter().map(|p| (p.owner, p.position))
    }
}

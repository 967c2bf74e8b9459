//! Deterministic tower-defense simulation
//!
//! Same rules as `sim`: fixed timestep, seeded RNG, spawn-order iteration.
//! Enemies and projectiles are recycled through `EntityPool`s and referenced
//! by generational keys.

pub mod enemy;
pub mod enemy_spawner;
pub mod projectile;
pub mod projectile_manager;
pub mod state;
pub mod tick;
pub mod tower;
pub mod turret;
pub mod wave;

pub use enemy::{DeathDetail, Enemy, EnemyAttack, EnemyKind, EnemyProfile};
pub use enemy_spawner::{EnemyKey, EnemySpawner, SpawnReport};
pub use projectile::{HitTarget, Projectile, ProjectileOwner, Shot, SlowEffect};
pub use projectile_manager::{ProjectileHit, ProjectileManager};
pub use state::{DefenseEvent, DefenseState, PoolKind, WavePhase};
pub use tick::tick;
pub use tower::{TowerNode, nearest_enemy_in_range};
pub use turret::{TurretKind, TurretNode, TurretProfile};
pub use wave::{WaveAdvance, WaveController, WaveStats};

//! Tower-defense game state

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyKind};
use super::enemy_spawner::EnemySpawner;
use super::projectile::Projectile;
use super::projectile_manager::ProjectileManager;
use super::tower::TowerNode;
use super::turret::TurretNode;
use super::wave::WaveController;
use crate::polar_to_cartesian;
use crate::sim::combo::ComboManager;
use crate::sim::death::DeathSequenceController;
use crate::sim::machine::{MachineState, StateMachine};
use crate::sim::pool::EntityPool;
use crate::sim::random::DeterministicRandom;
use crate::tuning::{DefenseTuning, TowerTuning, Tuning};

/// RNG stream id for the enemy spawner
const ENEMY_STREAM: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    /// Breather before the next wave
    Intermission,
    InProgress,
}

impl MachineState for WavePhase {
    fn can_transition_to(self, next: Self) -> bool {
        self != next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolKind {
    Enemies,
    Projectiles,
}

/// Events the defense simulation reports to its collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefenseEvent {
    WaveStarted { chapter: u32, wave: u32, enemies: u32 },
    EnemySpawned { id: u32, kind: EnemyKind },
    EnemyDied { id: u32, kind: EnemyKind, position: Vec2, coins: u32, points: u64 },
    BossKilled { kind: EnemyKind, chapter: u32, wave: u32 },
    TowerDamaged { amount: f32, hp: f32 },
    TowerDestroyed,
    TurretDamaged { turret: usize, amount: f32, hp: f32 },
    TurretDestroyed { turret: usize },
    WaveComplete { chapter: u32, wave: u32, bonus_coins: u64 },
    ChapterCleared { chapter: u32 },
    PoolExhausted { pool: PoolKind, live: usize, cap: usize },
}

#[derive(Debug)]
pub struct DefenseState {
    pub wave: WaveController,
    pub spawner: EnemySpawner,
    pub projectiles: ProjectileManager,
    pub tower: TowerNode,
    pub turrets: Vec<TurretNode>,
    pub combo: ComboManager,
    pub death: DeathSequenceController,
    pub phase: StateMachine<WavePhase>,
    pub score: u64,
    pub kills: u32,
    pub waves_cleared: u32,
    kill_points: u64,
    tuning: DefenseTuning,
}

impl DefenseState {
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self::starting_at(seed, tuning, &tuning.defense.tower, 1, 1)
    }

    /// Resume at a saved wave with (possibly upgraded) tower stats
    pub fn starting_at(seed: u64, tuning: &Tuning, tower: &TowerTuning, chapter: u32, wave: u32) -> Self {
        let d = &tuning.defense;
        let enemy_pool = EntityPool::new(d.enemy_pool_prewarm, Enemy::default).with_cap(d.enemy_pool_cap);
        let projectile_pool =
            EntityPool::new(d.projectile_pool_prewarm, Projectile::default).with_cap(d.projectile_pool_cap);

        let count = d.turrets.len().max(1) as f32;
        let turrets = d
            .turrets
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let angle = std::f32::consts::TAU * i as f32 / count;
                TurretNode::new(kind, polar_to_cartesian(d.turret_orbit, angle))
            })
            .collect();

        Self {
            wave: WaveController::new(chapter, wave, d.waves_per_chapter),
            spawner: EnemySpawner::new(
                DeterministicRandom::derive(seed, ENEMY_STREAM),
                Vec2::ZERO,
                d.spawn_radius,
                enemy_pool,
            ),
            projectiles: ProjectileManager::new(
                projectile_pool,
                d.projectile_radius,
                d.player_projectile_range,
                d.enemy_projectile_range,
            ),
            tower: TowerNode::new(Vec2::ZERO, tower),
            turrets,
            combo: ComboManager::new(tuning.combo.clone()),
            death: DeathSequenceController::new(tuning.death.clone()),
            phase: StateMachine::new(WavePhase::Intermission),
            score: 0,
            kills: 0,
            waves_cleared: 0,
            kill_points: tuning.combo.kill_points,
            tuning: d.clone(),
        }
    }

    pub fn tuning(&self) -> &DefenseTuning {
        &self.tuning
    }

    pub fn kill_points(&self) -> u64 {
        self.kill_points
    }

    /// Scale every turret's damage (upgrades)
    pub fn set_turret_damage_multiplier(&mut self, multiplier: f32) {
        for turret in &mut self.turrets {
            turret.damage_multiplier = multiplier;
        }
    }

    /// Drop enemies and projectiles, repair the tower, and wait to restart the current wave
    pub fn restart_wave(&mut self) {
        log::info!("Restarting wave {}-{}", self.wave.chapter(), self.wave.wave());
        self.spawner.clear();
        self.projectiles.clear();
        self.tower.repair();
        for turret in &mut self.turrets {
            turret.reset();
        }
        self.combo.break_combo();
        self.phase.force(WavePhase::Intermission);
    }
}

//! Data-driven game balance
//!
//! Every section carries `#[serde(default)]` so a tuning file only needs the
//! values it overrides. Chapter configurations are a fixed table and live in
//! `sim::chapter`, not here.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tuning json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Energy node behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeTuning {
    pub max_stability: f32,
    /// Stability lost per second before kind/chaos/chapter multipliers
    pub base_decay_rate: f32,
    pub min_initial_stability: f32,
    pub max_initial_stability: f32,
    /// Fraction of max stability below which a node counts as unstable
    pub unstable_threshold: f32,
    /// Seconds between Phase node visibility toggles
    pub phase_interval: f32,
    /// Cosmetic spawn-in duration
    pub spawn_duration: f32,
}

impl Default for NodeTuning {
    fn default() -> Self {
        Self {
            max_stability: 100.0,
            base_decay_rate: 3.0,
            min_initial_stability: 60.0,
            max_initial_stability: 90.0,
            unstable_threshold: 0.3,
            phase_interval: 1.5,
            spawn_duration: 0.4,
        }
    }
}

/// Beam geometry and stabilization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamTuning {
    pub extension_speed: f32,
    pub max_length: f32,
    pub lock_distance: f32,
    /// A retracting beam that passed this close to a wrong-polarity node is a near miss
    pub near_miss_distance: f32,
    pub stabilization_rate: f32,
    pub fade_duration: f32,
}

impl Default for BeamTuning {
    fn default() -> Self {
        Self {
            extension_speed: 600.0,
            max_length: 360.0,
            lock_distance: 28.0,
            near_miss_distance: 56.0,
            stabilization_rate: 25.0,
            fade_duration: 0.35,
        }
    }
}

/// Node spawning around the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerTuning {
    pub spawn_interval: f32,
    pub max_active_nodes: usize,
    pub min_spawn_distance: f32,
    pub max_spawn_distance: f32,
    pub volatile_chance: f32,
    pub phase_chance: f32,
    pub fake_chance: f32,
}

impl Default for SpawnerTuning {
    fn default() -> Self {
        Self {
            spawn_interval: 2.0,
            max_active_nodes: 6,
            min_spawn_distance: 120.0,
            max_spawn_distance: 260.0,
            volatile_chance: 0.15,
            phase_chance: 0.10,
            fake_chance: 0.08,
        }
    }
}

/// Chaos pressure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosTuning {
    pub max_chaos: f32,
    pub chaos_cap: f32,
    pub passive_increase: f32,
    pub unstable_node_increase: f32,
    pub explosion_increase: f32,
    pub rapid_action_increase: f32,
    /// Fraction of `explosion_increase` removed by a correct stabilization
    pub stabilization_recovery: f32,
    pub wrong_action_window: f32,
    pub display_smoothing: f32,
    pub multiplier_max: f32,
    pub critical_threshold: f32,
}

impl Default for ChaosTuning {
    fn default() -> Self {
        Self {
            max_chaos: 100.0,
            chaos_cap: 100.0,
            passive_increase: 0.5,
            unstable_node_increase: 0.3,
            explosion_increase: 15.0,
            rapid_action_increase: 5.0,
            stabilization_recovery: 0.8,
            wrong_action_window: 3.0,
            display_smoothing: 0.05,
            multiplier_max: 2.5,
            critical_threshold: 80.0,
        }
    }
}

/// Time-based spawn ramp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    pub ramp_per_second: f32,
    pub min_interval_modifier: f32,
    pub capacity_step_seconds: f32,
    pub max_extra_nodes: usize,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            ramp_per_second: 0.002,
            min_interval_modifier: 0.45,
            capacity_step_seconds: 45.0,
            max_extra_nodes: 4,
        }
    }
}

/// Combo scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboTuning {
    pub window: f32,
    pub step: f32,
    pub max_multiplier: f32,
    pub stabilization_points: u64,
    pub kill_points: u64,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self {
            window: 3.0,
            step: 0.1,
            max_multiplier: 3.0,
            stabilization_points: 100,
            kill_points: 10,
        }
    }
}

/// Death/reset sequencing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathTuning {
    pub collapse_duration: f32,
    pub reset_delay: f32,
}

impl Default for DeathTuning {
    fn default() -> Self {
        Self {
            collapse_duration: 1.5,
            reset_delay: 1.0,
        }
    }
}

/// Central tower stats before upgrades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTuning {
    pub damage: f32,
    pub fire_rate: f32,
    pub range: f32,
    pub max_hp: f32,
    pub defense: f32,
    pub projectile_speed: f32,
    pub penetration: u32,
    pub rotation_smoothing: f32,
}

impl Default for TowerTuning {
    fn default() -> Self {
        Self {
            damage: 12.0,
            fire_rate: 2.0,
            range: 220.0,
            max_hp: 200.0,
            defense: 10.0,
            projectile_speed: 480.0,
            penetration: 1,
            rotation_smoothing: 0.2,
        }
    }
}

/// Tower-defense layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseTuning {
    pub tower: TowerTuning,
    /// Turret kinds placed evenly around the tower
    pub turrets: Vec<crate::defense::TurretKind>,
    pub turret_orbit: f32,
    pub spawn_radius: f32,
    pub intermission: f32,
    pub waves_per_chapter: u32,
    pub enemy_attack_interval: f32,
    pub enemy_projectile_speed: f32,
    pub player_projectile_range: f32,
    pub enemy_projectile_range: f32,
    pub projectile_radius: f32,
    /// `None` keeps the pools growing on demand
    pub enemy_pool_cap: Option<usize>,
    pub projectile_pool_cap: Option<usize>,
    pub enemy_pool_prewarm: usize,
    pub projectile_pool_prewarm: usize,
}

impl Default for DefenseTuning {
    fn default() -> Self {
        use crate::defense::TurretKind;
        Self {
            tower: TowerTuning::default(),
            turrets: vec![TurretKind::Blaster, TurretKind::Frost, TurretKind::Mortar],
            turret_orbit: 55.0,
            spawn_radius: 420.0,
            intermission: 3.0,
            waves_per_chapter: 50,
            enemy_attack_interval: 1.0,
            enemy_projectile_speed: 260.0,
            player_projectile_range: 600.0,
            enemy_projectile_range: 400.0,
            projectile_radius: 4.0,
            enemy_pool_cap: None,
            projectile_pool_cap: None,
            enemy_pool_prewarm: 32,
            projectile_pool_prewarm: 64,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub node: NodeTuning,
    pub beam: BeamTuning,
    pub spawner: SpawnerTuning,
    pub chaos: ChaosTuning,
    pub difficulty: DifficultyTuning,
    pub combo: ComboTuning,
    pub death: DeathTuning,
    pub defense: DefenseTuning,
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a tuning file, falling back to defaults when it is missing or malformed
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(err) => {
                log::warn!("Using default tuning ({}): {}", path.display(), err);
                Self::default()
            }
        }
    }
}

//! Saved player progress and tower upgrades

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::store::{KeyValueStore, PersistenceError};
use crate::tuning::TowerTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    Damage,
    FireRate,
    Range,
    Health,
    Defense,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 5] = [
        UpgradeKind::Damage,
        UpgradeKind::FireRate,
        UpgradeKind::Range,
        UpgradeKind::Health,
        UpgradeKind::Defense,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeKind::Damage => "damage",
            UpgradeKind::FireRate => "fire_rate",
            UpgradeKind::Range => "range",
            UpgradeKind::Health => "health",
            UpgradeKind::Defense => "defense",
        }
    }
}

/// Permanent tower upgrade levels bought with coins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeLevels {
    pub damage: u32,
    pub fire_rate: u32,
    pub range: u32,
    pub health: u32,
    pub defense: u32,
}

impl UpgradeLevels {
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Damage => self.damage,
            UpgradeKind::FireRate => self.fire_rate,
            UpgradeKind::Range => self.range,
            UpgradeKind::Health => self.health,
            UpgradeKind::Defense => self.defense,
        }
    }

    fn level_mut(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::Damage => &mut self.damage,
            UpgradeKind::FireRate => &mut self.fire_rate,
            UpgradeKind::Range => &mut self.range,
            UpgradeKind::Health => &mut self.health,
            UpgradeKind::Defense => &mut self.defense,
        }
    }

    /// Coins for the next level: `ceil(10 * 1.15^level)`
    pub fn cost(&self, kind: UpgradeKind) -> u64 {
        upgrade_cost(self.level(kind))
    }

    pub fn increment(&mut self, kind: UpgradeKind) {
        *self.level_mut(kind) += 1;
    }

    /// Tower stats with every level applied
    pub fn apply(&self, base: &TowerTuning) -> TowerTuning {
        TowerTuning {
            damage: base.damage * (1.0 + 0.10 * self.damage as f32),
            fire_rate: base.fire_rate * (1.0 + 0.05 * self.fire_rate as f32),
            range: base.range * (1.0 + 0.03 * self.range as f32),
            max_hp: base.max_hp * (1.0 + 0.10 * self.health as f32),
            defense: base.defense + 2.0 * self.defense as f32,
            ..base.clone()
        }
    }

    /// Turrets share the damage upgrade
    pub fn turret_damage_multiplier(&self) -> f32 {
        1.0 + 0.10 * self.damage as f32
    }
}

pub fn upgrade_cost(level: u32) -> u64 {
    (10.0 * 1.15f64.powi(level as i32)).ceil() as u64
}

/// Everything that survives between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub coins: u64,
    pub gems: u64,
    /// Defense chapter/wave to resume at
    pub chapter: u32,
    pub wave: u32,
    /// Highest core-stability chapter reached
    pub best_chapter: u32,
    pub upgrades: UpgradeLevels,
    pub inventory: BTreeMap<String, u32>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            coins: 0,
            gems: 0,
            chapter: 1,
            wave: 1,
            best_chapter: 1,
            upgrades: UpgradeLevels::default(),
            inventory: BTreeMap::new(),
        }
    }
}

impl Progress {
    pub const STORAGE_KEY: &'static str = "stability_defense_progress";

    /// Load progress, falling back to first-run defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(json) = store.get(Self::STORAGE_KEY) else {
            log::info!("No saved progress, starting fresh");
            return Self::default();
        };
        match serde_json::from_str::<Progress>(&json) {
            Ok(progress) => {
                log::info!(
                    "Loaded progress: chapter {} wave {}, {} coins",
                    progress.chapter,
                    progress.wave,
                    progress.coins
                );
                progress
            }
            Err(err) => {
                log::warn!("Saved progress is corrupt, starting fresh: {}", err);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, json);
        Ok(())
    }

    pub fn add_item(&mut self, item: &str, count: u32) {
        *self.inventory.entry(item.to_string()).or_insert(0) += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::store::MemoryStore;

    #[test]
    fn test_cost_curve() {
        assert_eq!(upgrade_cost(0), 10);
        assert_eq!(upgrade_cost(1), 12);
        assert_eq!(upgrade_cost(5), 21);
        assert_eq!(upgrade_cost(10), 41);
    }

    #[test]
    fn test_upgrades_apply_to_tower() {
        let mut levels = UpgradeLevels::default();
        levels.increment(UpgradeKind::Damage);
        levels.increment(UpgradeKind::Damage);
        levels.increment(UpgradeKind::Defense);
        let tower = levels.apply(&TowerTuning::default());
        assert!((tower.damage - 14.4).abs() < 1e-4);
        assert_eq!(tower.defense, 12.0);
        assert_eq!(tower.range, 220.0);
        assert_eq!(levels.cost(UpgradeKind::Damage), 14);
    }

    #[test]
    fn test_first_run_and_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(Progress::load(&store), Progress::default());

        let mut progress = Progress::default();
        progress.coins = 120;
        progress.wave = 7;
        progress.add_item("shard", 2);
        progress.add_item("shard", 1);
        progress.save(&mut store).unwrap();
        let loaded = Progress::load(&store);
        assert_eq!(loaded, progress);
        assert_eq!(loaded.inventory["shard"], 3);
    }

    #[test]
    fn test_corrupt_progress_falls_back() {
        let mut store = MemoryStore::new();
        store.set(Progress::STORAGE_KEY, "{ broken".into());
        assert_eq!(Progress::load(&store), Progress::default());
    }
}

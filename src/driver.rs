//! Fixed-step driver for a play session
//!
//! Owns both simulations plus the player's wallet, turns variable frame
//! deltas into fixed ticks, and fans simulation events out to the economy
//! and analytics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::defense::{self, DefenseEvent, DefenseState};
use crate::persistence::{Progress, UpgradeKind, UpgradeLevels, Wallet};
use crate::sim::{self, CoreEvent, CoreState, TickInput};
use crate::telemetry::{AnalyticsSink, NullSink};
use crate::tuning::Tuning;

/// Gems for killing a boss or mini-boss
pub const BOSS_GEMS: u64 = 5;
/// Gems for clearing the final core chapter
pub const VICTORY_GEMS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Core(CoreEvent),
    Defense(DefenseEvent),
}

pub struct Simulation<A: AnalyticsSink = NullSink> {
    pub core: CoreState,
    pub defense: DefenseState,
    pub wallet: Wallet,
    upgrades: UpgradeLevels,
    inventory: BTreeMap<String, u32>,
    best_chapter: u32,
    analytics: A,
    accumulator: f32,
    ticks: u64,
}

impl Simulation<NullSink> {
    pub fn new(seed: u64, tuning: &Tuning, progress: &Progress) -> Self {
        Self::with_analytics(seed, tuning, progress, NullSink)
    }
}

impl<A: AnalyticsSink> Simulation<A> {
    /// Start a session from saved progress. Upgrades are baked into the
    /// tower here and do not change until the next session.
    pub fn with_analytics(seed: u64, tuning: &Tuning, progress: &Progress, analytics: A) -> Self {
        let core = CoreState::starting_at(seed, tuning, progress.best_chapter);
        let tower = progress.upgrades.apply(&tuning.defense.tower);
        let mut defense = DefenseState::starting_at(seed, tuning, &tower, progress.chapter, progress.wave);
        defense.set_turret_damage_multiplier(progress.upgrades.turret_damage_multiplier());

        log::info!(
            "Session start: seed {}, core chapter {}, defense chapter {} wave {}",
            seed,
            core.chapter.current_chapter(),
            defense.wave.chapter(),
            defense.wave.wave()
        );

        Self {
            core,
            defense,
            wallet: Wallet::new(progress.coins, progress.gems),
            upgrades: progress.upgrades,
            inventory: progress.inventory.clone(),
            best_chapter: progress.best_chapter.max(1),
            analytics,
            accumulator: 0.0,
            ticks: 0,
        }
    }

    pub fn analytics(&self) -> &A {
        &self.analytics
    }

    pub fn upgrades(&self) -> &UpgradeLevels {
        &self.upgrades
    }

    /// Fixed ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run as many fixed ticks as `frame_dt` covers.
    ///
    /// Pointer samples and the polarity toggle go to the first substep only;
    /// drag and idle mode hold for the whole frame.
    pub fn advance(&mut self, frame_dt: f32, input: &TickInput) -> Vec<GameEvent> {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += dt;

        let held = TickInput {
            pointer: Vec::new(),
            toggle_polarity: false,
            drag_delta: input.drag_delta,
            idle_mode: input.idle_mode,
        };

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let step_input = if substeps == 0 { input } else { &held };
            events.extend(self.step(step_input));
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        events
    }

    /// One fixed tick of both simulations
    pub fn step(&mut self, input: &TickInput) -> Vec<GameEvent> {
        self.ticks += 1;
        let core_events = sim::tick(&mut self.core, input, SIM_DT);
        let defense_events = defense::tick(&mut self.defense, SIM_DT);

        for event in &core_events {
            self.on_core_event(event);
        }
        for event in &defense_events {
            self.on_defense_event(event);
        }

        core_events
            .into_iter()
            .map(GameEvent::Core)
            .chain(defense_events.into_iter().map(GameEvent::Defense))
            .collect()
    }

    /// Spend coins on the next level of an upgrade; takes effect next session
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> bool {
        let bought = self.wallet.purchase_upgrade(&mut self.upgrades, kind);
        if bought {
            self.analytics.log_event(
                "upgrade_purchased",
                json!({ "upgrade": kind.as_str(), "level": self.upgrades.level(kind) }),
            );
        }
        bought
    }

    pub fn add_item(&mut self, item: &str, count: u32) {
        *self.inventory.entry(item.to_string()).or_insert(0) += count;
    }

    /// Snapshot for saving
    pub fn progress(&self) -> Progress {
        Progress {
            coins: self.wallet.coins(),
            gems: self.wallet.gems(),
            chapter: self.defense.wave.chapter(),
            wave: self.defense.wave.wave(),
            best_chapter: self.best_chapter,
            upgrades: self.upgrades,
            inventory: self.inventory.clone(),
        }
    }

    fn on_core_event(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::ChapterComplete { chapter } => {
                self.analytics.log_event(
                    "chapter_complete",
                    json!({ "chapter": chapter, "score": self.core.score }),
                );
            }
            CoreEvent::ChapterStarted { chapter } => {
                self.best_chapter = self.best_chapter.max(*chapter);
            }
            CoreEvent::Victory => {
                self.wallet.add_gems(VICTORY_GEMS, "victory");
                self.analytics.log_event("victory", json!({ "score": self.core.score }));
            }
            CoreEvent::CoreOverloaded => {
                self.analytics.log_event(
                    "core_overloaded",
                    json!({ "chapter": self.core.chapter.current_chapter() }),
                );
            }
            _ => {}
        }
    }

    fn on_defense_event(&mut self, event: &DefenseEvent) {
        match event {
            DefenseEvent::EnemyDied { coins, .. } => {
                self.wallet.add_coins(u64::from(*coins), "kill");
            }
            DefenseEvent::BossKilled { kind, chapter, wave } => {
                self.wallet.add_gems(BOSS_GEMS, kind.as_str());
                self.analytics.log_event(
                    "boss_killed",
                    json!({ "kind": kind.as_str(), "chapter": chapter, "wave": wave }),
                );
            }
            DefenseEvent::WaveComplete {
                chapter,
                wave,
                bonus_coins,
            } => {
                self.wallet.add_coins(*bonus_coins, "wave_bonus");
                self.analytics.log_event(
                    "wave_complete",
                    json!({ "chapter": chapter, "wave": wave, "bonus_coins": bonus_coins }),
                );
            }
            DefenseEvent::ChapterCleared { chapter } => {
                self.analytics
                    .log_event("defense_chapter_cleared", json!({ "chapter": chapter }));
            }
            DefenseEvent::TurretDestroyed { turret } => {
                self.analytics.log_event(
                    "turret_destroyed",
                    json!({ "turret": turret, "wave": self.defense.wave.wave() }),
                );
            }
            DefenseEvent::TowerDestroyed => {
                self.analytics.log_event(
                    "tower_destroyed",
                    json!({ "chapter": self.defense.wave.chapter(), "wave": self.defense.wave.wave() }),
                );
            }
            _ => {}
        }
    }
}

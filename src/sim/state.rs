//! Core-stability game state
//!
//! One context owns every manager of the minigame. Nothing here is global;
//! the driver constructs it and threads it through `tick`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::beam_manager::BeamManager;
use super::chaos::ChaosSystem;
use super::chapter::ChapterController;
use super::combo::ComboManager;
use super::death::DeathSequenceController;
use super::difficulty::DifficultyController;
use super::node::NodeKind;
use super::random::DeterministicRandom;
use super::spawner::NodeSpawner;
use crate::consts::CORE_RADIUS;
use crate::input::RotationControl;
use crate::tuning::Tuning;

/// RNG stream id for the node spawner
const NODE_STREAM: u64 = 1;

/// Events the core simulation reports to its collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoreEvent {
    NodeSpawned { id: u32, kind: NodeKind },
    NodeExploded { id: u32, kind: NodeKind, position: Vec2 },
    NodeStabilized { id: u32, kind: NodeKind, position: Vec2, points: u64 },
    BeamLocked { beam_id: u32, node_id: u32 },
    BeamCausedExplosion { beam_id: u32, node_id: u32 },
    /// Near miss with the wrong polarity
    WrongAction { beam_id: u32 },
    CriticalLoad { active: bool },
    ComboEnded { count: u32 },
    ChapterComplete { chapter: u32 },
    WorldReset { chapter: u32 },
    ChapterStarted { chapter: u32 },
    Victory,
    CoreOverloaded,
}

#[derive(Debug, Clone)]
pub struct CoreState {
    pub seed: u64,
    pub spawner: NodeSpawner,
    pub beams: BeamManager,
    pub chaos: ChaosSystem,
    pub chapter: ChapterController,
    pub difficulty: DifficultyController,
    pub combo: ComboManager,
    pub death: DeathSequenceController,
    pub rotation: RotationControl,
    pub score: u64,
    pub stabilized_total: u32,
    pub exploded_total: u32,
    pub time_ticks: u64,
    pub victory: bool,
    stabilization_points: u64,
}

impl CoreState {
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self::starting_at(seed, tuning, 1)
    }

    /// Resume at a saved chapter
    pub fn starting_at(seed: u64, tuning: &Tuning, chapter: u32) -> Self {
        let spawner = NodeSpawner::new(
            DeterministicRandom::derive(seed, NODE_STREAM),
            tuning.spawner.clone(),
            tuning.node.clone(),
        );
        let mut state = Self {
            seed,
            spawner,
            beams: BeamManager::new(Vec2::ZERO, CORE_RADIUS, tuning.beam.clone()),
            chaos: ChaosSystem::new(tuning.chaos.clone()),
            chapter: ChapterController::new(chapter),
            difficulty: DifficultyController::new(tuning.difficulty.clone()),
            combo: ComboManager::new(tuning.combo.clone()),
            death: DeathSequenceController::new(tuning.death.clone()),
            rotation: RotationControl::default(),
            score: 0,
            stabilized_total: 0,
            exploded_total: 0,
            time_ticks: 0,
            victory: false,
            stabilization_points: tuning.combo.stabilization_points,
        };
        state.apply_chapter_modifiers();
        state
    }

    pub fn stabilization_points(&self) -> u64 {
        self.stabilization_points
    }

    /// Push the current chapter's coefficients into the managers
    pub fn apply_chapter_modifiers(&mut self) {
        let config = self.chapter.config();
        self.chaos
            .set_modifiers(config.chaos_recovery_modifier, config.penalty_severity_modifier);
        self.beams.set_lock_scale(config.margin_of_error);
    }

    /// Decay multiplier handed to nodes this tick
    pub fn node_decay_multiplier(&self) -> f32 {
        self.chaos.decay_rate_multiplier() * self.chapter.config().system_decay_modifier
    }

    /// Clear nodes, beams and pressure; score and chapter survive.
    /// Returns the critical-load exit if the core was critical.
    pub fn reset_world(&mut self) -> Option<CoreEvent> {
        log::info!("World reset (chapter {})", self.chapter.current_chapter());
        self.spawner.clear();
        self.beams.clear();
        self.difficulty.reset();
        self.combo.break_combo();
        self.chaos
            .reset()
            .map(|_| CoreEvent::CriticalLoad { active: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_chapter_modifiers() {
        let state = CoreState::starting_at(1, &Tuning::default(), 5);
        assert_eq!(state.chapter.current_chapter(), 5);
        assert!((state.beams.lock_distance() - 28.0 * 0.84).abs() < 1e-4);
        assert!((state.node_decay_multiplier() - 1.48).abs() < 1e-5);
    }

    #[test]
    fn test_reset_world_clears_pressure() {
        let mut state = CoreState::new(1, &Tuning::default());
        state.spawner.spawn_node();
        state.chaos.on_explosion();
        state.score = 500;
        assert_eq!(state.reset_world(), None);
        assert!(state.spawner.is_empty());
        assert_eq!(state.chaos.chaos_level(), 0.0);
        assert_eq!(state.score, 500);
    }
}

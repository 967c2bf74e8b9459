//! Deterministic core-stability simulation
//!
//! All minigame logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by spawn order)
//! - No rendering or platform dependencies

pub mod beam;
pub mod beam_manager;
pub mod chaos;
pub mod chapter;
pub mod combo;
pub mod death;
pub mod difficulty;
pub mod machine;
pub mod node;
pub mod pool;
pub mod random;
pub mod spawner;
pub mod state;
pub mod tick;

pub use beam::{Beam, BeamState};
pub use beam_manager::{BeamEvent, BeamManager};
pub use chaos::{ChaosSignal, ChaosSystem};
pub use chapter::{CHAPTER_COUNT, ChapterConfig, ChapterController, ChapterSignal, Tally, chapter_config};
pub use combo::ComboManager;
pub use death::{DeathPhase, DeathSequenceController, DeathSignal};
pub use difficulty::DifficultyController;
pub use machine::{InvalidTransition, MachineState, StateMachine};
pub use node::{EnergyNode, NodeKind, NodeKindProfile, NodeOutcome, Polarity, Stabilization};
pub use pool::{EntityPool, PoolError, Poolable};
pub use random::DeterministicRandom;
pub use spawner::{NodeKey, NodeSpawner, SpawnerReport};
pub use state::{CoreEvent, CoreState};
pub use tick::{TickInput, tick};

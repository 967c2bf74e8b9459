//! Stability Defense headless runner
//!
//! Usage: `stability-defense [seed] [seconds]`
//!
//! Plays an autopilot session at a fixed frame rate and logs the outcome.
//! Set `STABILITY_DEFENSE_SAVE` to a file path to load and save progress, and
//! `STABILITY_DEFENSE_TUNING` to a JSON file overriding balance values.

use stability_defense::Simulation;
use stability_defense::defense::DefenseEvent;
use stability_defense::driver::GameEvent;
use stability_defense::persistence::{JsonFileStore, Progress};
use stability_defense::sim::{CoreEvent, TickInput};
use stability_defense::telemetry::LogSink;
use stability_defense::tuning::Tuning;

const DEFAULT_SEED: u64 = 12345;
const DEFAULT_SECONDS: f32 = 120.0;
/// Simulated display refresh
const FRAME_DT: f32 = 1.0 / 60.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SEED);
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_SECONDS);

    let mut store = std::env::var("STABILITY_DEFENSE_SAVE")
        .ok()
        .map(|path| JsonFileStore::open(path));
    let progress = match &store {
        Some(store) => Progress::load(store),
        None => Progress::default(),
    };

    let tuning = match std::env::var("STABILITY_DEFENSE_TUNING") {
        Ok(path) => Tuning::load_or_default(path),
        Err(_) => Tuning::default(),
    };

    log::info!("Stability Defense (headless) seed {} for {:.0}s", seed, seconds);
    let mut sim = Simulation::with_analytics(seed, &tuning, &progress, LogSink);

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let frames = (seconds / FRAME_DT).round() as u64;
    let mut overloads = 0u32;
    let mut tower_losses = 0u32;
    let mut kills = 0u32;
    for _ in 0..frames {
        for event in sim.advance(FRAME_DT, &input) {
            match event {
                GameEvent::Core(CoreEvent::CoreOverloaded) => overloads += 1,
                GameEvent::Core(CoreEvent::ChapterComplete { chapter }) => {
                    log::info!("Core chapter {} complete", chapter);
                }
                GameEvent::Core(CoreEvent::Victory) => log::info!("Victory!"),
                GameEvent::Defense(DefenseEvent::EnemyDied { .. }) => kills += 1,
                GameEvent::Defense(DefenseEvent::TowerDestroyed) => tower_losses += 1,
                _ => {}
            }
        }
    }

    log::info!(
        "Core: chapter {}, score {}, stabilized {}, exploded {}, overloads {}",
        sim.core.chapter.current_chapter(),
        sim.core.score,
        sim.core.stabilized_total,
        sim.core.exploded_total,
        overloads
    );
    log::info!(
        "Defense: chapter {} wave {}, waves cleared {}, kills {}, tower losses {}",
        sim.defense.wave.chapter(),
        sim.defense.wave.wave(),
        sim.defense.waves_cleared,
        kills,
        tower_losses
    );
    log::info!("Wallet: {} coins, {} gems", sim.wallet.coins(), sim.wallet.gems());

    if let Some(store) = store.as_mut() {
        let saved = sim.progress().save(store).and_then(|_| store.flush());
        match saved {
            Ok(()) => log::info!("Progress saved to {}", store.path().display()),
            Err(err) => log::error!("Failed to save progress: {}", err),
        }
    }
}

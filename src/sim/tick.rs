//! Fixed timestep simulation tick
//!
//! Advances the core-stability game deterministically. Update order:
//! death sequence -> input -> difficulty -> nodes -> beams -> chaos ->
//! chapter -> combo -> pruning.

use super::beam::BeamState;
use super::beam_manager::BeamEvent;
use super::chaos::ChaosSignal;
use super::chapter::{ChapterSignal, Tally};
use super::death::DeathSignal;
use super::node::{NodeKind, NodeOutcome};
use super::state::{CoreEvent, CoreState};
use crate::input::{PointerEvent, PointerPhase};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer samples in world coordinates, applied in order
    pub pointer: Vec<PointerEvent>,
    /// Flip beam polarity
    pub toggle_polarity: bool,
    /// Horizontal rotation-drag delta in pixels (None = not dragging)
    pub drag_delta: Option<f32>,
    /// Idle/demo mode - the autopilot plays
    pub idle_mode: bool,
}

/// Advance the core state by one fixed timestep
pub fn tick(state: &mut CoreState, input: &TickInput, dt: f32) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    state.time_ticks += 1;

    match input.drag_delta {
        Some(delta) => state.rotation.drag(delta, dt),
        None => state.rotation.release(),
    }
    state.rotation.update(dt);

    if state.victory {
        return events;
    }

    if state.death.is_dying() {
        match state.death.update(dt) {
            Some(DeathSignal::ResetRequested) => {
                let cleared = state.reset_world();
                let signal = state.chapter.restart_chapter();
                state.apply_chapter_modifiers();
                events.push(CoreEvent::WorldReset {
                    chapter: state.chapter.current_chapter(),
                });
                events.extend(cleared);
                if signal == ChapterSignal::Victory {
                    state.victory = true;
                    events.push(CoreEvent::Victory);
                }
            }
            Some(DeathSignal::Revived) => {
                state.beams.set_input_enabled(true);
                events.push(CoreEvent::ChapterStarted {
                    chapter: state.chapter.current_chapter(),
                });
            }
            None => {}
        }
        return events;
    }

    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }
    apply_input(state, &input);

    state.difficulty.update(dt);
    state
        .spawner
        .set_interval_modifier(state.difficulty.spawn_interval_modifier());
    state
        .spawner
        .set_extra_capacity(state.difficulty.extra_node_capacity());

    let decay = state.node_decay_multiplier();
    let report = state.spawner.update(dt, decay);
    for key in report.spawned {
        if let Some(node) = state.spawner.get(key) {
            events.push(CoreEvent::NodeSpawned {
                id: node.id,
                kind: node.kind,
            });
        }
    }
    handle_outcomes(state, report.outcomes, &mut events);

    let beam_events = state.beams.update(dt, &mut state.spawner);
    for event in beam_events {
        match event {
            BeamEvent::Locked { beam_id, node_id, .. } => {
                events.push(CoreEvent::BeamLocked { beam_id, node_id });
            }
            BeamEvent::CausedExplosion { beam_id, node, node_id } => {
                events.push(CoreEvent::BeamCausedExplosion { beam_id, node_id });
                let outcomes = state.spawner.explode_node(node);
                handle_outcomes(state, outcomes, &mut events);
            }
            BeamEvent::NearMiss { beam_id, .. } => {
                state.chaos.on_wrong_action();
                events.push(CoreEvent::WrongAction { beam_id });
            }
            BeamEvent::Stabilized { outcome, .. } => {
                handle_outcomes(state, vec![outcome], &mut events);
            }
        }
    }

    let unstable = state.spawner.unstable_count();
    for signal in state.chaos.update(dt, unstable) {
        match signal {
            ChaosSignal::CriticalLoadEntered => events.push(CoreEvent::CriticalLoad { active: true }),
            ChaosSignal::CriticalLoadCleared => events.push(CoreEvent::CriticalLoad { active: false }),
            ChaosSignal::Overloaded => {
                log::info!("Core overloaded at chaos {:.1}", state.chaos.chaos_level());
                state.death.trigger();
                state.beams.set_input_enabled(false);
                events.push(CoreEvent::CoreOverloaded);
            }
        }
    }

    for signal in state.chapter.update(dt) {
        match signal {
            ChapterSignal::WorldResetRequested { next_chapter } => {
                let cleared = state.reset_world();
                events.push(CoreEvent::WorldReset { chapter: next_chapter });
                events.extend(cleared);
            }
            ChapterSignal::ChapterStarted { chapter } => {
                state.apply_chapter_modifiers();
                events.push(CoreEvent::ChapterStarted { chapter });
            }
            ChapterSignal::Victory => {
                state.victory = true;
                state.beams.set_input_enabled(false);
                events.push(CoreEvent::Victory);
            }
        }
    }

    if let Some(count) = state.combo.update(dt) {
        events.push(CoreEvent::ComboEnded { count });
    }

    state.spawner.prune_terminal();

    events
}

fn apply_input(state: &mut CoreState, input: &TickInput) {
    if input.toggle_polarity {
        state.beams.toggle_polarity();
    }
    for pointer in &input.pointer {
        match pointer.phase {
            PointerPhase::Began => {
                state.beams.shoot_towards(pointer.position);
            }
            PointerPhase::Moved => {
                state.beams.update_target(pointer.position);
            }
            PointerPhase::Ended => {
                state.beams.end_beam();
            }
            PointerPhase::Cancelled => {
                state.beams.cancel(&mut state.spawner);
            }
        }
    }
}

fn handle_outcomes(state: &mut CoreState, outcomes: Vec<NodeOutcome>, events: &mut Vec<CoreEvent>) {
    for outcome in outcomes {
        match outcome {
            NodeOutcome::Exploded { id, kind, position } => {
                state.exploded_total += 1;
                state.chaos.on_explosion_scaled(kind.profile().chaos_penalty);
                if let Some(count) = state.combo.break_combo() {
                    events.push(CoreEvent::ComboEnded { count });
                }
                events.push(CoreEvent::NodeExploded { id, kind, position });
            }
            NodeOutcome::Stabilized { id, kind, position } => {
                state.stabilized_total += 1;
                state.chaos.on_stabilization();
                let base = state.stabilization_points();
                let points = state.combo.register(base);
                state.score += points;
                events.push(CoreEvent::NodeStabilized {
                    id,
                    kind,
                    position,
                    points,
                });
                if let Tally::ChapterComplete { chapter } = state.chapter.on_node_stabilized() {
                    events.push(CoreEvent::ChapterComplete { chapter });
                }
            }
        }
    }
}

/// Idle/demo mode: aim at the oldest node that can be matched, flipping
/// polarity first if needed, and let go as soon as the beam locks.
fn autopilot(state: &CoreState, input: &mut TickInput) {
    match state.beams.active_beam().map(|b| (b.state(), b.tip())) {
        Some((BeamState::Locked, tip)) => {
            input.pointer.push(PointerEvent::ended(tip));
        }
        Some(_) => {}
        None => {
            let target = state.spawner.iter().find(|(_, node)| {
                !node.is_terminal()
                    && !node.is_stabilizing()
                    && !node.is_phasing()
                    && node.kind != NodeKind::Fake
            });
            if let Some((_, node)) = target {
                if node.polarity != state.beams.polarity() {
                    input.toggle_polarity = true;
                }
                input.pointer.push(PointerEvent::began(node.position));
            }
        }
    }
}

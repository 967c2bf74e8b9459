//! Fixed timestep tower-defense tick
//!
//! Update order: death sequence -> intermission -> spawning -> enemies ->
//! tower and turrets -> projectiles -> deaths -> wave completion -> combo.

use super::enemy::EnemyAttack;
use super::projectile::{ProjectileOwner, Shot};
use super::projectile_manager::ProjectileHit;
use super::state::{DefenseEvent, DefenseState, PoolKind, WavePhase};
use super::wave::WaveAdvance;
use crate::consts::TOWER_RADIUS;
use crate::sim::death::DeathSignal;
use crate::sim::pool::PoolError;

/// Advance the defense state by one fixed timestep
pub fn tick(state: &mut DefenseState, dt: f32) -> Vec<DefenseEvent> {
    let mut events = Vec::new();

    if state.death.is_dying() {
        if let Some(DeathSignal::ResetRequested) = state.death.update(dt) {
            state.restart_wave();
        }
        return events;
    }

    state.phase.update(dt);
    if state.phase.is(WavePhase::Intermission) {
        if state.phase.time_in_state() < state.tuning().intermission {
            return events;
        }
        state.spawner.begin_wave(&state.wave);
        state.phase.force(WavePhase::InProgress);
        events.push(DefenseEvent::WaveStarted {
            chapter: state.wave.chapter(),
            wave: state.wave.wave(),
            enemies: state.wave.enemy_count_for_wave(),
        });
    }

    let report = state.spawner.update(dt);
    for key in report.spawned {
        if let Some(enemy) = state.spawner.get(key) {
            events.push(DefenseEvent::EnemySpawned {
                id: enemy.id,
                kind: enemy.kind,
            });
        }
    }
    if let Some(err) = report.exhausted {
        events.push(exhausted(PoolKind::Enemies, err));
    }

    let attack_interval = state.tuning().enemy_attack_interval;
    let enemy_projectile_speed = state.tuning().enemy_projectile_speed;
    for (_, attack) in state.spawner.update_enemies(dt, TOWER_RADIUS, attack_interval) {
        match attack {
            EnemyAttack::Melee { damage } => {
                let amount = state.tower.take_damage(damage);
                if amount > 0.0 {
                    events.push(DefenseEvent::TowerDamaged {
                        amount,
                        hp: state.tower.hp(),
                    });
                }
            }
            EnemyAttack::Ranged {
                origin,
                direction,
                damage,
            } => {
                let shot = Shot {
                    owner: ProjectileOwner::Enemy,
                    origin,
                    direction,
                    speed: enemy_projectile_speed,
                    damage,
                    penetration: 1,
                    explosion_radius: 0.0,
                    slow: None,
                };
                if let Err(err) = state.projectiles.fire(&shot) {
                    events.push(exhausted(PoolKind::Projectiles, err));
                }
            }
        }
    }

    let mut shots = Vec::new();
    shots.extend(state.tower.update(dt, &state.spawner));
    for turret in &mut state.turrets {
        shots.extend(turret.update(dt, &state.spawner));
    }
    for shot in &shots {
        if let Err(err) = state.projectiles.fire(shot) {
            events.push(exhausted(PoolKind::Projectiles, err));
            break;
        }
    }

    let hits = state
        .projectiles
        .update(dt, &mut state.spawner, &mut state.tower, &mut state.turrets);
    for hit in hits {
        match hit {
            ProjectileHit::Tower { damage } if damage > 0.0 => {
                events.push(DefenseEvent::TowerDamaged {
                    amount: damage,
                    hp: state.tower.hp(),
                });
            }
            ProjectileHit::Turret { index, damage } if damage > 0.0 => {
                let hp = state.turrets.get(index).map_or(0.0, |t| t.hp());
                events.push(DefenseEvent::TurretDamaged {
                    turret: index,
                    amount: damage,
                    hp,
                });
                if hp <= 0.0 {
                    log::info!("Turret {} destroyed", index);
                    events.push(DefenseEvent::TurretDestroyed { turret: index });
                }
            }
            _ => {}
        }
    }

    let kill_points = state.kill_points();
    for detail in state.spawner.resolve_deaths() {
        state.kills += 1;
        let points = state.combo.register(kill_points);
        state.score += points;
        events.push(DefenseEvent::EnemyDied {
            id: detail.id,
            kind: detail.kind,
            position: detail.position,
            coins: detail.coin_value,
            points,
        });
        if detail.kind.is_boss() {
            events.push(DefenseEvent::BossKilled {
                kind: detail.kind,
                chapter: state.wave.chapter(),
                wave: state.wave.wave(),
            });
        }
        if detail.should_split {
            match state.spawner.spawn_split(&detail) {
                Ok(children) => {
                    for key in children {
                        if let Some(child) = state.spawner.get(key) {
                            events.push(DefenseEvent::EnemySpawned {
                                id: child.id,
                                kind: child.kind,
                            });
                        }
                    }
                }
                Err(err) => events.push(exhausted(PoolKind::Enemies, err)),
            }
        }
    }

    if state.tower.is_destroyed() {
        log::info!("Tower destroyed on wave {}-{}", state.wave.chapter(), state.wave.wave());
        state.death.trigger();
        state.combo.break_combo();
        events.push(DefenseEvent::TowerDestroyed);
        return events;
    }

    if state.phase.is(WavePhase::InProgress) && state.spawner.is_wave_clear() {
        let chapter = state.wave.chapter();
        let wave = state.wave.wave();
        let bonus_coins = state.wave.wave_bonus();
        state.waves_cleared += 1;
        events.push(DefenseEvent::WaveComplete {
            chapter,
            wave,
            bonus_coins,
        });
        if let WaveAdvance::ChapterCleared { chapter } = state.wave.advance() {
            events.push(DefenseEvent::ChapterCleared { chapter });
        }
        state.phase.force(WavePhase::Intermission);
    }

    state.combo.update(dt);

    events
}

fn exhausted(pool: PoolKind, err: PoolError) -> DefenseEvent {
    let PoolError::Exhausted { live, cap } = err;
    DefenseEvent::PoolExhausted { pool, live, cap }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::defense::enemy::EnemyKind;
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn run(state: &mut DefenseState, seconds: f32) -> Vec<DefenseEvent> {
        let mut events = Vec::new();
        let ticks = (seconds / SIM_DT).round() as usize;
        for _ in 0..ticks {
            events.extend(tick(state, SIM_DT));
        }
        events
    }

    #[test]
    fn test_first_wave_is_cleared() {
        let mut state = DefenseState::new(7, &Tuning::default());
        let events = run(&mut state, 2.9);
        assert!(events.is_empty());

        let events = run(&mut state, 40.0);
        assert!(events.contains(&DefenseEvent::WaveStarted {
            chapter: 1,
            wave: 1,
            enemies: 5
        }));
        let died = events
            .iter()
            .filter(|e| matches!(e, DefenseEvent::EnemyDied { .. }))
            .count();
        assert!(died >= 5);
        assert!(events.contains(&DefenseEvent::WaveComplete {
            chapter: 1,
            wave: 1,
            bonus_coins: 5
        }));
        assert!(state.wave.wave() >= 2);
        assert!(!state.tower.is_destroyed());
    }

    #[test]
    fn test_tower_destruction_restarts_wave() {
        let mut state = DefenseState::new(7, &Tuning::default());
        state.turrets.clear();
        state.tower.damage = 0.0;
        let events = run(&mut state, 4.0);
        assert!(events.iter().any(|e| matches!(e, DefenseEvent::WaveStarted { .. })));

        state.tower.take_damage(1e6);
        let events = run(&mut state, SIM_DT);
        assert_eq!(events.last(), Some(&DefenseEvent::TowerDestroyed));
        assert!(state.death.is_dying());

        run(&mut state, 2.0);
        assert!(state.spawner.is_empty());
        assert_eq!(state.tower.hp(), state.tower.max_hp);
        assert!(state.phase.is(WavePhase::Intermission));
        assert_eq!(state.wave.wave(), 1);

        let events = run(&mut state, 5.0);
        assert!(events.contains(&DefenseEvent::WaveStarted {
            chapter: 1,
            wave: 1,
            enemies: 5
        }));
    }

    #[test]
    fn test_enemy_fire_destroys_turret_until_restart() {
        let mut state = DefenseState::new(7, &Tuning::default());
        let turret = state.turrets[0].position;
        state
            .projectiles
            .fire(&Shot {
                owner: ProjectileOwner::Enemy,
                origin: turret + Vec2::new(100.0, 0.0),
                direction: -Vec2::X,
                speed: 260.0,
                damage: 1e6,
                penetration: 1,
                explosion_radius: 0.0,
                slow: None,
            })
            .unwrap();
        let events = run(&mut state, 1.0);
        assert!(events.iter().any(|e| matches!(e, DefenseEvent::TurretDamaged { turret: 0, hp, .. } if *hp == 0.0)));
        assert!(events.contains(&DefenseEvent::TurretDestroyed { turret: 0 }));
        assert!(!events.iter().any(|e| matches!(e, DefenseEvent::TowerDamaged { .. })));
        assert!(state.turrets[0].is_destroyed());

        state.restart_wave();
        assert_eq!(state.turrets[0].hp(), state.turrets[0].max_hp);
    }

    #[test]
    fn test_splitter_death_spawns_children() {
        let mut state = DefenseState::new(7, &Tuning::default());
        run(&mut state, 3.0);
        let key = state.spawner.spawn(EnemyKind::Splitter, Vec2::new(300.0, 0.0)).unwrap();
        state.spawner.get_mut(key).unwrap().take_damage(1e6);
        let events = tick(&mut state, SIM_DT);
        let splitlings = events
            .iter()
            .filter(|e| matches!(e, DefenseEvent::EnemySpawned { kind: EnemyKind::Splitling, .. }))
            .count();
        assert_eq!(splitlings, 2);
        assert!(events.iter().any(|e| matches!(e, DefenseEvent::EnemyDied { kind: EnemyKind::Splitter, .. })));
    }

    #[test]
    fn test_pool_cap_reports_exhaustion() {
        let mut tuning = Tuning::default();
        tuning.defense.enemy_pool_cap = Some(1);
        tuning.defense.turrets.clear();
        let mut state = DefenseState::new(7, &tuning);
        state.tower.damage = 0.0;
        let events = run(&mut state, 6.0);
        assert!(events.iter().any(|e| matches!(
            e,
            DefenseEvent::PoolExhausted {
                pool: PoolKind::Enemies,
                live: 1,
                cap: 1
            }
        )));
        assert_eq!(state.spawner.len(), 1);
    }

    #[test]
    fn test_determinism() {
        let mut a = DefenseState::new(2024, &Tuning::default());
        let mut b = DefenseState::new(2024, &Tuning::default());
        assert_eq!(run(&mut a, 30.0), run(&mut b, 30.0));
        assert_eq!(a.score, b.score);
    }
}

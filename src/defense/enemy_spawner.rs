//! Wave spawning and enemy ownership
//!
//! Enemies live in a slot map keyed by [`EnemyKey`]; the objects themselves
//! are recycled through an [`EntityPool`] when they die or the wave is reset.

use glam::Vec2;
use slotmap::{SlotMap, new_key_type};

use super::enemy::{DeathDetail, Enemy, EnemyAttack, EnemyKind};
use super::wave::{WaveController, WaveStats};
use crate::polar_to_cartesian;
use crate::sim::pool::{EntityPool, PoolError};
use crate::sim::random::DeterministicRandom;

new_key_type! {
    /// Generational handle to an enemy owned by the [`EnemySpawner`]
    pub struct EnemyKey;
}

/// Offset of each splitling from its parent
pub const SPLIT_OFFSET: f32 = 12.0;

const BAND_EARLY: &[(EnemyKind, u32)] = &[(EnemyKind::Grunt, 70), (EnemyKind::Runner, 30)];
const BAND_MID: &[(EnemyKind, u32)] = &[
    (EnemyKind::Grunt, 45),
    (EnemyKind::Runner, 25),
    (EnemyKind::Brute, 15),
    (EnemyKind::Swarmer, 15),
];
const BAND_LATE: &[(EnemyKind, u32)] = &[
    (EnemyKind::Grunt, 30),
    (EnemyKind::Runner, 20),
    (EnemyKind::Brute, 15),
    (EnemyKind::Archer, 15),
    (EnemyKind::Shielder, 10),
    (EnemyKind::Swarmer, 10),
];
const BAND_ENDLESS: &[(EnemyKind, u32)] = &[
    (EnemyKind::Grunt, 20),
    (EnemyKind::Runner, 15),
    (EnemyKind::Brute, 15),
    (EnemyKind::Archer, 15),
    (EnemyKind::Shielder, 15),
    (EnemyKind::Splitter, 10),
    (EnemyKind::Bomber, 10),
];

/// Weighted roll table for an effective wave
pub fn band_for(effective_wave: u32) -> &'static [(EnemyKind, u32)] {
    match effective_wave {
        0..=5 => BAND_EARLY,
        6..=15 => BAND_MID,
        16..=30 => BAND_LATE,
        _ => BAND_ENDLESS,
    }
}

/// What happened during one spawn update
#[derive(Debug, Clone, Default)]
pub struct SpawnReport {
    pub spawned: Vec<EnemyKey>,
    /// Set when the pool cap blocked a spawn; it is retried next interval
    pub exhausted: Option<PoolError>,
}

#[derive(Debug)]
pub struct EnemySpawner {
    enemies: SlotMap<EnemyKey, Enemy>,
    order: Vec<EnemyKey>,
    pool: EntityPool<Enemy>,
    rng: DeterministicRandom,
    center: Vec2,
    spawn_radius: f32,
    next_id: u32,
    // Current wave schedule
    stats: WaveStats,
    effective_wave: u32,
    finale: Option<EnemyKind>,
    wave_total: u32,
    spawned_this_wave: u32,
    interval: f32,
    spawn_timer: f32,
}

impl EnemySpawner {
    pub fn new(rng: DeterministicRandom, center: Vec2, spawn_radius: f32, pool: EntityPool<Enemy>) -> Self {
        Self {
            enemies: SlotMap::with_key(),
            order: Vec::new(),
            pool,
            rng,
            center,
            spawn_radius,
            next_id: 1,
            stats: WaveController::default().stats(),
            effective_wave: 1,
            finale: None,
            wave_total: 0,
            spawned_this_wave: 0,
            interval: 1.0,
            spawn_timer: 0.0,
        }
    }

    /// Schedule the wave the controller is currently on
    pub fn begin_wave(&mut self, wave: &WaveController) {
        self.stats = wave.stats();
        self.effective_wave = wave.effective_wave();
        self.wave_total = wave.enemy_count_for_wave();
        self.spawned_this_wave = 0;
        self.interval = wave.spawn_interval_for_wave();
        // First enemy appears on the first update
        self.spawn_timer = self.interval;
        self.finale = if wave.is_boss_wave() {
            Some(EnemyKind::Boss)
        } else if wave.is_mini_boss_wave() {
            Some(EnemyKind::MiniBoss)
        } else {
            None
        };
        log::info!(
            "Wave {}-{}: {} enemies every {:.2}s",
            wave.chapter(),
            wave.wave(),
            self.wave_total,
            self.interval
        );
    }

    pub fn get(&self, key: EnemyKey) -> Option<&Enemy> {
        self.enemies.get(key)
    }

    pub fn get_mut(&mut self, key: EnemyKey) -> Option<&mut Enemy> {
        self.enemies.get_mut(key)
    }

    /// Enemies in spawn order
    pub fn iter(&self) -> impl Iterator<Item = (EnemyKey, &Enemy)> + '_ {
        self.order.iter().filter_map(|&key| self.enemies.get(key).map(|e| (key, e)))
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.enemies.values().filter(|e| e.is_alive()).count()
    }

    pub fn pending_count(&self) -> u32 {
        self.wave_total - self.spawned_this_wave
    }

    pub fn pool(&self) -> &EntityPool<Enemy> {
        &self.pool
    }

    pub fn finished_spawning(&self) -> bool {
        self.spawned_this_wave >= self.wave_total
    }

    /// All scheduled enemies spawned and none left standing
    pub fn is_wave_clear(&self) -> bool {
        self.finished_spawning() && self.enemies.is_empty()
    }

    pub fn update(&mut self, dt: f32) -> SpawnReport {
        let mut report = SpawnReport::default();
        if self.finished_spawning() {
            return report;
        }
        self.spawn_timer += dt;
        if self.spawn_timer < self.interval {
            return report;
        }

        let last = self.spawned_this_wave + 1 == self.wave_total;
        let kind = match self.finale {
            Some(boss) if last => boss,
            _ => self.select_kind(),
        };
        let angle = self.rng.angle();
        let position = self.center + polar_to_cartesian(self.spawn_radius, angle);

        match self.spawn(kind, position) {
            Ok(key) => {
                self.spawned_this_wave += 1;
                self.spawn_timer = 0.0;
                report.spawned.push(key);
            }
            Err(err) => {
                log::warn!("Enemy spawn deferred: {}", err);
                self.spawn_timer = 0.0;
                report.exhausted = Some(err);
            }
        }
        report
    }

    pub fn select_kind(&mut self) -> EnemyKind {
        self.rng
            .weighted(band_for(self.effective_wave))
            .unwrap_or(EnemyKind::Grunt)
    }

    /// Take an enemy from the pool and place it with the current wave stats
    pub fn spawn(&mut self, kind: EnemyKind, position: Vec2) -> Result<EnemyKey, PoolError> {
        let mut enemy = self.pool.get()?;
        let id = self.next_id;
        self.next_id += 1;
        enemy.setup(id, kind, position, self.center, &self.stats);
        log::debug!("Spawned {} #{} at ({:.0}, {:.0})", kind.as_str(), id, position.x, position.y);
        let key = self.enemies.insert(enemy);
        self.order.push(key);
        Ok(key)
    }

    /// Two splitlings either side of a dead splitter
    pub fn spawn_split(&mut self, parent: &DeathDetail) -> Result<Vec<EnemyKey>, PoolError> {
        let toward = (self.center - parent.position).normalize_or(Vec2::X);
        let side = toward.perp() * SPLIT_OFFSET;
        let mut children = Vec::with_capacity(2);
        for offset in [side, -side] {
            children.push(self.spawn(EnemyKind::Splitling, parent.position + offset)?);
        }
        Ok(children)
    }

    /// Advance every living enemy in spawn order and collect their attacks
    pub fn update_enemies(&mut self, dt: f32, target_radius: f32, attack_interval: f32) -> Vec<(EnemyKey, EnemyAttack)> {
        let mut attacks = Vec::new();
        for &key in &self.order {
            if let Some(enemy) = self.enemies.get_mut(key)
                && let Some(attack) = enemy.update(dt, target_radius, attack_interval)
            {
                attacks.push((key, attack));
            }
        }
        attacks
    }

    /// Kill every enemy that ran out of HP, recycle it, and report the deaths
    pub fn resolve_deaths(&mut self) -> Vec<DeathDetail> {
        let mut deaths = Vec::new();
        let mut removed = false;
        for &key in &self.order {
            let Some(enemy) = self.enemies.get_mut(key) else {
                continue;
            };
            if !enemy.is_dying() {
                continue;
            }
            if let Some(detail) = enemy.die() {
                deaths.push(detail);
            }
            if let Some(enemy) = self.enemies.remove(key) {
                self.pool.return_to_pool(enemy);
                removed = true;
            }
        }
        if removed {
            let enemies = &self.enemies;
            self.order.retain(|key| enemies.contains_key(*key));
        }
        deaths
    }

    /// Recycle every enemy and forget the wave schedule
    pub fn clear(&mut self) {
        for key in self.order.drain(..) {
            if let Some(enemy) = self.enemies.remove(key) {
                self.pool.return_to_pool(enemy);
            }
        }
        self.enemies.clear();
        self.wave_total = 0;
        self.spawned_this_wave = 0;
        self.spawn_timer = 0.0;
        self.finale = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawner(cap: Option<usize>) -> EnemySpawner {
        EnemySpawner::new(
            DeterministicRandom::new(42),
            Vec2::ZERO,
            420.0,
            EntityPool::new(4, Enemy::default).with_cap(cap),
        )
    }

    fn run(s: &mut EnemySpawner, seconds: f32, dt: f32) -> Vec<EnemyKey> {
        let mut spawned = Vec::new();
        let steps = (seconds / dt).round() as usize;
        for _ in 0..steps {
            spawned.extend(s.update(dt).spawned);
        }
        spawned
    }

    #[test]
    fn test_bands() {
        assert_eq!(band_for(1), BAND_EARLY);
        assert_eq!(band_for(5), BAND_EARLY);
        assert_eq!(band_for(6), BAND_MID);
        assert_eq!(band_for(30), BAND_LATE);
        assert_eq!(band_for(31), BAND_ENDLESS);
    }

    #[test]
    fn test_wave_spawns_full_count_on_ring() {
        let mut s = spawner(None);
        s.begin_wave(&WaveController::new(1, 1, 50));
        let spawned = run(&mut s, 10.0, 0.1);
        assert_eq!(spawned.len(), 5);
        assert!(s.finished_spawning());
        for (_, e) in s.iter() {
            assert!((e.position.length() - 420.0).abs() < 1e-2);
            assert!(matches!(e.kind, EnemyKind::Grunt | EnemyKind::Runner));
        }
        assert!(!s.is_wave_clear());
    }

    #[test]
    fn test_boss_is_last_enemy() {
        let mut s = spawner(None);
        s.begin_wave(&WaveController::new(1, 10, 50));
        let spawned = run(&mut s, 20.0, 0.1);
        assert_eq!(spawned.len(), 10);
        let kinds: Vec<_> = spawned.iter().map(|&k| s.get(k).unwrap().kind).collect();
        assert_eq!(kinds.last(), Some(&EnemyKind::Boss));
        assert_eq!(kinds.iter().filter(|k| k.is_boss()).count(), 1);

        let mut s = spawner(None);
        s.begin_wave(&WaveController::new(1, 5, 50));
        let spawned = run(&mut s, 20.0, 0.1);
        assert_eq!(s.get(*spawned.last().unwrap()).unwrap().kind, EnemyKind::MiniBoss);
    }

    #[test]
    fn test_deaths_recycle_and_clear_wave() {
        let mut s = spawner(None);
        s.begin_wave(&WaveController::new(1, 1, 50));
        let spawned = run(&mut s, 10.0, 0.1);
        for &key in &spawned {
            s.get_mut(key).unwrap().take_damage(1e6);
        }
        let deaths = s.resolve_deaths();
        assert_eq!(deaths.len(), 5);
        assert_eq!(deaths.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert!(s.is_wave_clear());
        assert_eq!(s.pool().live(), 0);
        assert!(s.get(spawned[0]).is_none());
        assert!(s.resolve_deaths().is_empty());
    }

    #[test]
    fn test_split_spawns_two_children() {
        let mut s = spawner(None);
        let parent = DeathDetail {
            id: 1,
            kind: EnemyKind::Splitter,
            position: Vec2::new(200.0, 0.0),
            coin_value: 3,
            should_split: true,
        };
        let children = s.spawn_split(&parent).unwrap();
        assert_eq!(children.len(), 2);
        let a = s.get(children[0]).unwrap();
        let b = s.get(children[1]).unwrap();
        assert_eq!(a.kind, EnemyKind::Splitling);
        assert!((a.position.distance(b.position) - 2.0 * SPLIT_OFFSET).abs() < 1e-4);
        assert!((a.position.x - 200.0).abs() < 1e-4);
    }

    #[test]
    fn test_pool_cap_defers_spawn() {
        let mut s = spawner(Some(2));
        s.begin_wave(&WaveController::new(1, 1, 50));
        let mut exhausted = 0;
        for _ in 0..100 {
            if s.update(0.1).exhausted.is_some() {
                exhausted += 1;
            }
        }
        assert_eq!(s.len(), 2);
        assert!(exhausted > 0);
        assert_eq!(s.pending_count(), 3);
    }

    #[test]
    fn test_same_seed_same_wave() {
        let mut a = spawner(None);
        let mut b = spawner(None);
        let wave = WaveController::new(1, 20, 50);
        a.begin_wave(&wave);
        b.begin_wave(&wave);
        run(&mut a, 30.0, 0.1);
        run(&mut b, 30.0, 0.1);
        let left: Vec<_> = a.iter().map(|(_, e)| (e.kind, e.position)).collect();
        let right: Vec<_> = b.iter().map(|(_, e)| (e.kind, e.position)).collect();
        assert_eq!(left, right);
    }
}

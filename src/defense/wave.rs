//! Wave scaling
//!
//! Every stat is a pure function of the effective wave
//! `(chapter - 1) * waves_per_chapter + wave`. The controller only tracks
//! where in the campaign we are.

use serde::{Deserialize, Serialize};

pub const DEFAULT_WAVES_PER_CHAPTER: u32 = 50;

/// Stats every enemy of a wave starts from, before kind multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveStats {
    pub hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub coin_value: u32,
}

/// Result of moving past a completed wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveAdvance {
    NextWave { chapter: u32, wave: u32 },
    /// The last wave of `chapter` was cleared; now on wave 1 of the next one
    ChapterCleared { chapter: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveController {
    chapter: u32,
    wave: u32,
    waves_per_chapter: u32,
}

impl Default for WaveController {
    fn default() -> Self {
        Self::new(1, 1, DEFAULT_WAVES_PER_CHAPTER)
    }
}

impl WaveController {
    pub fn new(chapter: u32, wave: u32, waves_per_chapter: u32) -> Self {
        let waves_per_chapter = waves_per_chapter.max(1);
        Self {
            chapter: chapter.max(1),
            wave: wave.clamp(1, waves_per_chapter),
            waves_per_chapter,
        }
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn waves_per_chapter(&self) -> u32 {
        self.waves_per_chapter
    }

    pub fn effective_wave(&self) -> u32 {
        (self.chapter - 1) * self.waves_per_chapter + self.wave
    }

    pub fn enemy_count_for_wave(&self) -> u32 {
        let ew = self.effective_wave();
        if ew <= 15 {
            5 + ew / 2
        } else if ew <= 35 {
            12 + (ew - 15)
        } else {
            (32 + (ew - 35) / 3).min(60)
        }
    }

    /// Seconds between spawns
    pub fn spawn_interval_for_wave(&self) -> f32 {
        let ew = self.effective_wave() as f32;
        if ew <= 15.0 {
            1.2
        } else if ew <= 35.0 {
            1.2 - 0.02 * (ew - 15.0)
        } else {
            (0.8 - 0.005 * (ew - 35.0)).max(0.35)
        }
    }

    pub fn enemy_hp_for_wave(&self) -> f32 {
        20.0 * 1.065f32.powi(self.effective_wave() as i32)
    }

    pub fn enemy_damage_for_wave(&self) -> f32 {
        5.0 * 1.045f32.powi(self.effective_wave() as i32)
    }

    /// Exponential growth damped by a log term, hard-capped at 220 px/s
    pub fn enemy_speed_for_wave(&self) -> f32 {
        let ew = self.effective_wave() as f32;
        let raw = 60.0 * 1.012f32.powf(ew) / (1.0 + 0.08 * (1.0 + ew).ln());
        raw.min(220.0)
    }

    pub fn coin_value_for_wave(&self) -> u32 {
        let coins = (2.0 * 1.03f32.powi(self.effective_wave() as i32)).round();
        (coins as u32).max(1)
    }

    /// Coins paid out for clearing the current wave
    pub fn wave_bonus(&self) -> u64 {
        self.coin_value_for_wave() as u64 * self.enemy_count_for_wave() as u64 / 2
    }

    pub fn is_boss_wave(&self) -> bool {
        self.wave % 10 == 0
    }

    pub fn is_mini_boss_wave(&self) -> bool {
        self.wave % 5 == 0 && !self.is_boss_wave()
    }

    pub fn stats(&self) -> WaveStats {
        WaveStats {
            hp: self.enemy_hp_for_wave(),
            damage: self.enemy_damage_for_wave(),
            speed: self.enemy_speed_for_wave(),
            coin_value: self.coin_value_for_wave(),
        }
    }

    /// Move to the next wave, rolling into the next chapter after the last
    pub fn advance(&mut self) -> WaveAdvance {
        if self.wave >= self.waves_per_chapter {
            let cleared = self.chapter;
            self.chapter += 1;
            self.wave = 1;
            log::info!("Defense chapter {} cleared", cleared);
            return WaveAdvance::ChapterCleared { chapter: cleared };
        }
        self.wave += 1;
        WaveAdvance::NextWave {
            chapter: self.chapter,
            wave: self.wave,
        }
    }

    /// Jump to a saved position
    pub fn set_position(&mut self, chapter: u32, wave: u32) {
        self.chapter = chapter.max(1);
        self.wave = wave.clamp(1, self.waves_per_chapter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(chapter: u32, wave: u32) -> WaveController {
        WaveController::new(chapter, wave, DEFAULT_WAVES_PER_CHAPTER)
    }

    #[test]
    fn test_chapter_one_wave_twenty() {
        let w = at(1, 20);
        assert_eq!(w.effective_wave(), 20);
        assert_eq!(w.enemy_count_for_wave(), 17);
        let hp = w.enemy_hp_for_wave();
        assert!((hp - 20.0 * 1.065f32.powi(20)).abs() < 1e-3);
        assert!((hp - 71.2).abs() < 1.0, "hp {hp}");
        assert!(w.is_boss_wave());
    }

    #[test]
    fn test_count_bands() {
        assert_eq!(at(1, 1).enemy_count_for_wave(), 5);
        assert_eq!(at(1, 15).enemy_count_for_wave(), 12);
        assert_eq!(at(1, 16).enemy_count_for_wave(), 13);
        assert_eq!(at(1, 35).enemy_count_for_wave(), 32);
        assert_eq!(at(1, 36).enemy_count_for_wave(), 32);
        assert_eq!(at(1, 38).enemy_count_for_wave(), 33);
        assert_eq!(at(3, 50).enemy_count_for_wave(), 60);
    }

    #[test]
    fn test_interval_bands() {
        assert_eq!(at(1, 10).spawn_interval_for_wave(), 1.2);
        assert!((at(1, 25).spawn_interval_for_wave() - 1.0).abs() < 1e-5);
        assert!((at(1, 45).spawn_interval_for_wave() - 0.75).abs() < 1e-5);
        assert_eq!(at(4, 1).spawn_interval_for_wave(), 0.35);
    }

    #[test]
    fn test_chapter_offsets_effective_wave() {
        assert_eq!(at(2, 3).effective_wave(), 53);
        let expected = at(1, 50).enemy_hp_for_wave() * 1.065f32.powi(3);
        assert!((at(2, 3).enemy_hp_for_wave() / expected - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_speed_capped_and_coins_floor() {
        assert!((at(1, 1).enemy_speed_for_wave() - 57.53).abs() < 0.05);
        assert_eq!(at(10, 50).enemy_speed_for_wave(), 220.0);
        assert_eq!(at(1, 1).coin_value_for_wave(), 2);
        assert_eq!(at(1, 1).wave_bonus(), 5);
    }

    #[test]
    fn test_boss_cadence() {
        assert!(at(1, 10).is_boss_wave());
        assert!(!at(1, 10).is_mini_boss_wave());
        assert!(at(1, 5).is_mini_boss_wave());
        assert!(at(1, 15).is_mini_boss_wave());
        assert!(!at(1, 7).is_mini_boss_wave());
    }

    #[test]
    fn test_advance_rolls_chapter() {
        let mut w = at(1, 49);
        assert_eq!(w.advance(), WaveAdvance::NextWave { chapter: 1, wave: 50 });
        assert_eq!(w.advance(), WaveAdvance::ChapterCleared { chapter: 1 });
        assert_eq!((w.chapter(), w.wave()), (2, 1));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_formulas_are_pure(chapter in 1u32..12, wave in 1u32..=50) {
                let w = at(chapter, wave);
                prop_assert_eq!(w.enemy_hp_for_wave().to_bits(), w.enemy_hp_for_wave().to_bits());
                prop_assert_eq!(w.stats(), w.stats());
                prop_assert!(w.enemy_count_for_wave() >= 5 && w.enemy_count_for_wave() <= 60);
                prop_assert!(w.spawn_interval_for_wave() >= 0.35);
                prop_assert!(w.enemy_speed_for_wave() <= 220.0);
                prop_assert!(w.coin_value_for_wave() >= 1);
            }
        }
    }
}

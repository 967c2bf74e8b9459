//! Seeded random source
//!
//! Each spawner owns its own stream. Nothing in the hot path may touch
//! wall-clock time or OS entropy.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Reproducible float/bool stream derived from a seed
#[derive(Debug, Clone)]
pub struct DeterministicRandom {
    seed: u64,
    rng: Pcg32,
}

impl DeterministicRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Derive an independent stream for a sibling subsystem
    pub fn derive(seed: u64, stream: u64) -> Self {
        Self::new(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the stream from its seed
    pub fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
    }

    /// Uniform float in [0, 1)
    pub fn next_float(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    pub fn next_bool(&mut self) -> bool {
        self.rng.random::<bool>()
    }

    /// Uniform float in [min, max); returns `min` for an empty range
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..max)
    }

    /// True with the given probability
    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_float() < probability
    }

    /// Uniform angle in [0, τ)
    pub fn angle(&mut self) -> f32 {
        self.next_float() * std::f32::consts::TAU
    }

    /// Pick from a weighted table; zero-weight entries are never chosen
    pub fn weighted<T: Copy>(&mut self, table: &[(T, u32)]) -> Option<T> {
        let total: u32 = table.iter().map(|(_, w)| *w).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.rng.random_range(0..total);
        for &(item, weight) in table {
            if roll < weight {
                return Some(item);
            }
            roll -= weight;
        }
        None
    }
}

//! Seeded random streams for the simulation.
//!
//! Each subsystem draws from its own PCG stream so that one subsystem's call count never
//! shifts another's sequence. Same seed, same inputs, same match.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const ASTEROID_STREAM: u64 = 0xa57e_401d;
const AI_STREAM: u64 = 0xb07_b07;
const POWER_UP_STREAM: u64 = 0x90_3e2_0b5;

#[derive(Debug, Clone)]
pub struct SimRng {
    inner: Pcg32,
}

impl SimRng {
    pub fn new(seed: u64, stream: u64) -> Self {
        Self {
            inner: Pcg32::new(seed, stream),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Uniform in `[min, max)`; returns `min` for an empty range.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..max)
    }

    pub fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..max)
    }

    /// Uniform in `[-magnitude, magnitude)`.
    pub fn signed(&mut self, magnitude: f32) -> f32 {
        self.range(-magnitude, magnitude)
    }

    pub fn int_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..=max)
    }

    pub fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.inner.random_range(0..len)
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    pub fn angle(&mut self) -> f32 {
        self.range(0.0, std::f32::consts::TAU)
    }

    /// Picks an index according to integer weights. Returns `None` when all weights are zero.
    pub fn weighted(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u32 = weights.iter().sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.inner.random_range(0..total);
        for (i, w) in weights.iter().enumerate() {
            if roll < *w {
                return Some(i);
            }
            roll -= *w;
        }
        None
    }
}

/// One independent stream per concern.
#[derive(Debug, Clone)]
pub struct RngStreams {
    pub asteroid: SimRng,
    pub ai: SimRng,
    pub power_up: SimRng,
}

impl RngStreams {
    pub fn new(seed: u64) -> Self {
        Self {
            asteroid: SimRng::new(seed, ASTEROID_STREAM),
            ai: SimRng::new(seed, AI_STREAM),
            power_up: SimRng::new(seed, POWER_UP_STREAM),
        }
    }
}

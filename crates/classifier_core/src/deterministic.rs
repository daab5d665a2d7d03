//! Deterministic pseudo-randomness for reproducible data splits
//!
//! A seeded LCG drives the optional held-out calibration split so that a
//! given seed always produces the same partition on every platform.

use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses constants from Numerical Recipes (glibc)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<i64>,
}

impl LcgRng {
    const MULTIPLIER: i64 = 1103515245;
    const INCREMENT: i64 = 12345;
    const MODULUS: i64 = 1 << 31;

    pub fn new(seed: i64) -> Self {
        Self {
            state: Wrapping(seed.wrapping_abs() % Self::MODULUS),
        }
    }

    /// Generate next value in range [0, MODULUS)
    pub fn next_i64(&mut self) -> i64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 & (Self::MODULUS - 1)
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_i64() as u64 % max as u64) as usize
    }

    /// Uniform value in [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        self.next_i64() as f64 / Self::MODULUS as f64
    }
}

/// Partition `0..n` into (kept, held_out) index lists.
///
/// The held-out part has `round(n * fraction)` entries chosen by a seeded
/// Fisher-Yates shuffle; both lists are returned in ascending order.
pub fn holdout_split(n: usize, fraction: f64, seed: i64) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = LcgRng::new(seed);
    for i in (1..n).rev() {
        let j = rng.next_range(i + 1);
        order.swap(i, j);
    }

    let held = ((n as f64) * fraction).round() as usize;
    let held = held.min(n);
    let mut held_out = order[..held].to_vec();
    let mut kept = order[held..].to_vec();
    held_out.sort_unstable();
    kept.sort_unstable();
    (kept, held_out)
}

//! Deterministic utilities for reproducible training
//!
//! Per-tree seed derivation and split tie-breaking, so that a forest is a
//! pure function of (data, config) regardless of how many threads build it.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::Ordering;

/// SplitMix64 finalizer.
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Seed for tree `tree_idx` of a forest seeded with `base_seed`.
pub fn tree_seed(base_seed: u64, tree_idx: usize) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;
    mix64(base_seed.wrapping_add(GOLDEN_GAMMA.wrapping_mul(tree_idx as u64 + 1)))
}

/// RNG owned by a single tree.
pub fn tree_rng(base_seed: u64, tree_idx: usize) -> StdRng {
    StdRng::seed_from_u64(tree_seed(base_seed, tree_idx))
}

/// Deterministic tie-breaker for split selection
///
/// Equal-impurity candidates are ordered by (feature_idx, threshold).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: f64,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: f64) -> Self {
        Self {
            feature_idx,
            threshold,
        }
    }

    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.feature_idx
            .cmp(&other.feature_idx)
            .then_with(|| self.threshold.total_cmp(&other.threshold))
    }
}

//! Row sampling for large tables.
//!
//! Tables above a row threshold are audited on a seeded random subset so
//! that repeated runs over the same data see the same rows.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Default number of rows kept when a table is sampled.
pub const DEFAULT_SAMPLE_SIZE: usize = 100_000;

/// Default row count above which a table is sampled.
pub const DEFAULT_SAMPLE_THRESHOLD: usize = 1_000_000;

/// Default seed of the sampling generator.
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// When and how much to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    /// Rows kept per sampled table
    pub sample_size: usize,
    /// Tables with more rows than this are sampled
    pub sample_threshold: usize,
    /// Generator seed
    pub seed: u64,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            sample_threshold: DEFAULT_SAMPLE_THRESHOLD,
            seed: DEFAULT_SAMPLE_SEED,
        }
    }
}

impl SamplingPolicy {
    /// Creates a policy with the given size and threshold and the default seed.
    pub fn new(sample_size: usize, sample_threshold: usize) -> Self {
        Self {
            sample_size,
            sample_threshold,
            seed: DEFAULT_SAMPLE_SEED,
        }
    }

    /// Builder method to set the generator seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Row indices to analyze for a table of `total` rows, ascending.
    ///
    /// Returns `None` when the table is at or below the threshold and every
    /// row is analyzed.
    pub fn select(&self, total: usize) -> Option<Vec<usize>> {
        if total <= self.sample_threshold {
            return None;
        }
        let amount = self.sample_size.min(total);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut picked = rand::seq::index::sample(&mut rng, total, amount).into_vec();
        picked.sort_unstable();
        Some(picked)
    }
}

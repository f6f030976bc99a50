//! Deterministic, forkable randomness for search.
//!
//! Every random decision the engines make (expansion order, outcome
//! sampling, rollout moves, filter tie-breaks) draws from a `SearchRng`
//! seeded from configuration, so a search is reproducible from its seed.
//!
//! ```
//! use catan_search::core::SearchRng;
//!
//! let mut rng = SearchRng::new(42);
//! let mut rollout_rng = rng.fork();
//!
//! let mut again = SearchRng::new(42);
//! let mut rollout_again = again.fork();
//! assert_eq!(rollout_rng.gen_range_usize(0..100), rollout_again.gen_range_usize(0..100));
//! ```

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// ChaCha8-backed RNG with deterministic forking.
#[derive(Clone, Debug)]
pub struct SearchRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl SearchRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Fork an independent stream.
    ///
    /// Successive forks of the same parent produce different sequences;
    /// two parents with equal seeds produce equal forks.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(fork_seed)
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Uniform float in `[0, 1)`.
    pub fn gen_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// `true` with the given probability (clamped to `[0, 1]`).
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability.clamp(0.0, 1.0))
    }

    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }

    /// Pick an index with probability proportional to its weight.
    ///
    /// Weights need not sum to 1. Returns `None` when the slice is empty
    /// or no weight is positive. Negative weights count as zero.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
        if weights.is_empty() || total <= 0.0 || !total.is_finite() {
            return None;
        }

        let mut threshold = self.gen_f64() * total;
        let mut last_positive = None;

        for (i, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            last_positive = Some(i);
            threshold -= weight;
            if threshold < 0.0 {
                return Some(i);
            }
        }

        // Rounding can leave a sliver of threshold behind.
        last_positive
    }
}

//! Alpha-Beta configuration parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::eval::ValueFnConfig;

/// Default search depth in plies.
pub const DEFAULT_DEPTH: u32 = 2;

/// Default wall-clock budget per decision.
pub const DEFAULT_MAX_TIME: Duration = Duration::from_secs(20);

/// Alpha-Beta configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlphaBetaConfig {
    /// Plies to search. The root is always expanded, so 0 acts as 1.
    pub max_depth: u32,

    /// Wall-clock budget, measured from the start of `decide`.
    pub max_time: Duration,

    /// Apply the pruning filter pipeline at every internal node.
    pub pruning: bool,

    /// Alpha-beta cutoffs. Disabled, the search is plain expectimax.
    pub cutoffs: bool,

    #[serde(default)]
    pub value_fn: ValueFnConfig,

    /// Seed for the filter RNG.
    pub seed: u64,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_DEPTH,
            max_time: DEFAULT_MAX_TIME,
            pruning: false,
            cutoffs: true,
            value_fn: ValueFnConfig::default(),
            seed: 42,
        }
    }
}

impl AlphaBetaConfig {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = max_time;
        self
    }

    pub fn with_pruning(mut self, enabled: bool) -> Self {
        self.pruning = enabled;
        self
    }

    pub fn with_cutoffs(mut self, enabled: bool) -> Self {
        self.cutoffs = enabled;
        self
    }

    pub fn with_value_fn(mut self, value_fn: ValueFnConfig) -> Self {
        self.value_fn = value_fn;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

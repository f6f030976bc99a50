//! Alpha-Beta search statistics.

use serde::{Deserialize, Serialize};

/// Work done by one Alpha-Beta decision.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AlphaBetaStats {
    /// Recursive calls, root excluded.
    pub nodes: u64,

    /// Static evaluations.
    pub leaf_evaluations: u64,

    /// Loops stopped by an alpha or beta cutoff.
    pub cutoffs: u64,

    /// Calls answered statically because the deadline had passed.
    pub deadline_hits: u64,

    pub time_us: u64,
}

impl AlphaBetaStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The deadline cut the search short at least once.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.deadline_hits > 0
    }
}

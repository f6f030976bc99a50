//! MCTS search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Statistics collected during one MCTS decision.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Playouts performed.
    pub playouts: u32,

    /// Nodes added to the tree.
    pub nodes_expanded: u32,

    /// Actions played inside rollouts.
    pub rollout_steps: u64,

    /// Rollouts stopped by the rollout limit.
    pub truncated_rollouts: u32,

    /// Maximum depth reached during search.
    pub max_depth: u16,

    /// Total time spent searching (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all statistics to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn playouts_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.playouts as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    /// Average rollout length.
    #[must_use]
    pub fn avg_rollout_length(&self) -> f64 {
        if self.playouts == 0 {
            0.0
        } else {
            self.rollout_steps as f64 / self.playouts as f64
        }
    }
}

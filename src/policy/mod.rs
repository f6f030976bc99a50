//! Rollout policies: how a playout picks moves once the tree stops.
//!
//! The set is closed and selected by configuration (`PolicyKind`):
//! - `RandomPolicy`: uniform over legal actions
//! - `WeightedPolicy`: random, weighted by action family
//! - `HeuristicPolicy`: greedy on a static evaluator

pub mod rollout;
pub mod weights;

pub use rollout::{HeuristicPolicy, RandomPolicy, RolloutPolicy, WeightedPolicy};
pub use weights::{ActionWeights, PolicyKind};

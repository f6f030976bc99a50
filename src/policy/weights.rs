//! Rollout policy configuration.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::rollout::{HeuristicPolicy, RandomPolicy, RolloutPolicy, WeightedPolicy};
use crate::core::Result;
use crate::eval::ValueFnConfig;
use crate::game::{ActionFamily, BoardView};

/// Sampling weight per action family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionWeights {
    /// Weight for families without an explicit entry.
    pub default_weight: f64,

    #[serde(default)]
    pub families: FxHashMap<ActionFamily, f64>,
}

impl Default for ActionWeights {
    /// Favour building, discourage trading and robber moves.
    fn default() -> Self {
        let families = [
            (ActionFamily::BuildCity, 20.0),
            (ActionFamily::BuildSettlement, 20.0),
            (ActionFamily::BuildRoad, 2.0),
            (ActionFamily::BuyDevelopmentCard, 2.0),
            (ActionFamily::MaritimeTrade, 0.01),
            (ActionFamily::MoveRobber, 0.01),
        ]
        .into_iter()
        .collect();

        Self {
            default_weight: 1.0,
            families,
        }
    }
}

impl ActionWeights {
    /// Every family weighs the same.
    #[must_use]
    pub fn uniform() -> Self {
        Self {
            default_weight: 1.0,
            families: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_weight(mut self, family: ActionFamily, weight: f64) -> Self {
        self.families.insert(family, weight);
        self
    }

    #[must_use]
    pub fn weight(&self, family: ActionFamily) -> f64 {
        self.families
            .get(&family)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

/// Which rollout policy to use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyKind {
    Random,
    Weighted {
        #[serde(default)]
        weights: ActionWeights,
    },
    Heuristic {
        #[serde(default)]
        value_fn: ValueFnConfig,
    },
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Weighted {
            weights: ActionWeights::default(),
        }
    }
}

impl PolicyKind {
    /// Instantiate the configured policy.
    pub fn build<S: BoardView>(&self) -> Result<Box<dyn RolloutPolicy<S>>> {
        Ok(match self {
            PolicyKind::Random => Box::new(RandomPolicy),
            PolicyKind::Weighted { weights } => Box::new(WeightedPolicy::new(weights.clone())),
            PolicyKind::Heuristic { value_fn } => Box::new(HeuristicPolicy::new(value_fn.build()?)),
        })
    }
}

//! Weighted value functions over board features.
//!
//! Two parameter sets exist:
//! - `Base`: 8 weights, victory points at `1e6`
//! - `Contender`: 6 weights, victory points at `1e10`, plus hand-size
//!   and longest-road adjustments
//!
//! Any weights vector of the right length can be supplied through
//! `ValueFnConfig`, so new tunings need no code changes.

use serde::{Deserialize, Serialize};

use super::{terminal_value, Evaluator};
use crate::core::{PlayerId, Result, SearchError};
use crate::game::{BoardView, ResourceVector};

/// Probability of one pip on two dice (1/36), as a percentage.
const PROBA_POINT: f64 = 2.778 / 100.0;

/// Each distinct produced resource counts as this many pips.
const TRANSLATE_VARIETY: f64 = 4.0;

/// Hand size above which the robber threatens a discard.
const SAFE_HAND_SIZE: u32 = 7;

/// Base weights: VP, longest road, dev cards in hand, dev cards played,
/// knights played, own production, opponent production, reachable
/// production.
pub const BASE_WEIGHTS: [f64; 8] = [1e6, 10.0, 10.0, 10.1, 10.1, 1000.0, 1000.0, 10.0];

/// Contender weights: VP, own production, opponent production, reachable
/// production, hand size, longest road factor.
pub const CONTENDER_WEIGHTS: [f64; 6] = [1e10, 1e8, 1e8, 1e4, 1e3, 10.0];

/// Production score with an optional bonus for resource variety.
#[must_use]
pub fn value_production(production: &ResourceVector, include_variety: bool) -> f64 {
    let variety = if include_variety {
        production.variety() as f64 * TRANSLATE_VARIETY * PROBA_POINT
    } else {
        0.0
    };
    production.total() + variety
}

/// Named parameter sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFnKind {
    #[default]
    Base,
    Contender,
}

impl ValueFnKind {
    #[must_use]
    pub fn default_weights(self) -> Vec<f64> {
        match self {
            ValueFnKind::Base => BASE_WEIGHTS.to_vec(),
            ValueFnKind::Contender => CONTENDER_WEIGHTS.to_vec(),
        }
    }

    #[must_use]
    pub fn weight_count(self) -> usize {
        match self {
            ValueFnKind::Base => BASE_WEIGHTS.len(),
            ValueFnKind::Contender => CONTENDER_WEIGHTS.len(),
        }
    }
}

/// Selects a value function and, optionally, its weights.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueFnConfig {
    pub kind: ValueFnKind,

    /// Overrides the kind's default weights when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
}

impl ValueFnConfig {
    #[must_use]
    pub fn base() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contender() -> Self {
        Self {
            kind: ValueFnKind::Contender,
            weights: None,
        }
    }

    /// Use an explicit weights vector.
    #[must_use]
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Build the value function, validating the weights vector.
    pub fn build(&self) -> Result<ValueFunction> {
        let weights = match &self.weights {
            Some(w) => w.clone(),
            None => self.kind.default_weights(),
        };

        if weights.len() != self.kind.weight_count() {
            return Err(SearchError::InvalidConfig(format!(
                "{:?} value function takes {} weights, got {}",
                self.kind,
                self.kind.weight_count(),
                weights.len()
            )));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite()) {
            return Err(SearchError::InvalidConfig(format!(
                "value function weight {bad} is not finite"
            )));
        }

        Ok(ValueFunction {
            kind: self.kind,
            weights,
        })
    }
}

/// A built, validated value function.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueFunction {
    kind: ValueFnKind,
    weights: Vec<f64>,
}

impl ValueFunction {
    #[must_use]
    pub fn kind(&self) -> ValueFnKind {
        self.kind
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Heuristic score ignoring whether the game has ended.
    pub fn features<S: BoardView>(&self, state: &S, agent: PlayerId) -> f64 {
        match self.kind {
            ValueFnKind::Base => self.base(state, agent),
            ValueFnKind::Contender => self.contender(state, agent),
        }
    }

    fn enemy_production<S: BoardView>(state: &S, agent: PlayerId) -> f64 {
        state
            .opponents(agent)
            .into_iter()
            .map(|p| value_production(&state.production(p), false))
            .sum()
    }

    fn development_terms<S: BoardView>(state: &S, agent: PlayerId) -> f64 {
        state.development_cards_in_hand(agent) as f64 * 10.0
            + state.development_cards_played(agent) as f64 * 10.1
            + state.knights_played(agent) as f64 * 10.1
    }

    fn base<S: BoardView>(&self, state: &S, agent: PlayerId) -> f64 {
        let w = &self.weights;
        let production = value_production(&state.production(agent), true);
        let reachable = state.reachable_production(agent).total();

        state.victory_points(agent) as f64 * w[0]
            + state.longest_road_length(agent) as f64 * w[1]
            + state.development_cards_in_hand(agent) as f64 * w[2]
            + state.development_cards_played(agent) as f64 * w[3]
            + state.knights_played(agent) as f64 * w[4]
            + production * w[5]
            - Self::enemy_production(state, agent) * w[6]
            + reachable * w[7]
    }

    fn contender<S: BoardView>(&self, state: &S, agent: PlayerId) -> f64 {
        let w = &self.weights;
        let production = value_production(&state.production(agent), true);
        let reachable = state.reachable_production(agent).total();

        let in_hand = state.resource_cards_in_hand(agent);
        let hand = if in_hand > SAFE_HAND_SIZE {
            -(in_hand as f64) * w[4]
        } else {
            in_hand as f64 * w[4]
        };

        // Roads only matter once there is nowhere left to settle.
        let road_factor = if state.buildable_spot_count(agent) == 0 {
            w[5]
        } else {
            0.1
        };

        state.victory_points(agent) as f64 * w[0]
            + production * w[1]
            - Self::enemy_production(state, agent) * w[2]
            + reachable * w[3]
            + hand
            + state.longest_road_length(agent) as f64 * road_factor
            + Self::development_terms(state, agent)
    }
}

impl<S: BoardView> Evaluator<S> for ValueFunction {
    fn evaluate(&self, state: &S, agent: PlayerId) -> f64 {
        terminal_value(state, agent).unwrap_or_else(|| self.features(state, agent))
    }
}

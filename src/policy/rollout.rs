//! Rollout (default) policies.
//!
//! A rollout policy picks one action per step while a playout races to a
//! terminal state. It never builds tree nodes, so it has to be cheap.

use crate::core::{Result, SearchError, SearchRng};
use crate::eval::Evaluator;
use crate::game::{outcomes, BoardView, GameState};

use super::weights::ActionWeights;

/// Chooses one of the legal actions during a rollout.
pub trait RolloutPolicy<S: GameState> {
    fn name(&self) -> &'static str;

    /// Pick one of `actions`. Fails on an empty slice.
    fn choose(&self, state: &S, actions: &[S::Action], rng: &mut SearchRng) -> Result<S::Action>;
}

fn ensure_actions<A>(actions: &[A]) -> Result<()> {
    if actions.is_empty() {
        return Err(SearchError::InvalidSearchStart("no legal actions to choose from"));
    }
    Ok(())
}

/// Uniformly random choice.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPolicy;

impl<S: GameState> RolloutPolicy<S> for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose(&self, _state: &S, actions: &[S::Action], rng: &mut SearchRng) -> Result<S::Action> {
        ensure_actions(actions)?;
        let idx = rng.gen_range_usize(0..actions.len());
        Ok(actions[idx].clone())
    }
}

/// Random choice weighted by action family.
#[derive(Clone, Debug, Default)]
pub struct WeightedPolicy {
    weights: ActionWeights,
}

impl WeightedPolicy {
    #[must_use]
    pub fn new(weights: ActionWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &ActionWeights {
        &self.weights
    }
}

impl<S: BoardView> RolloutPolicy<S> for WeightedPolicy {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn choose(&self, state: &S, actions: &[S::Action], rng: &mut SearchRng) -> Result<S::Action> {
        ensure_actions(actions)?;
        let weights: Vec<f64> = actions
            .iter()
            .map(|a| self.weights.weight(state.action_family(a)))
            .collect();

        // All-zero weights fall back to a uniform pick.
        let idx = match rng.choose_weighted(&weights) {
            Some(idx) => idx,
            None => rng.gen_range_usize(0..actions.len()),
        };
        Ok(actions[idx].clone())
    }
}

/// Greedy one-ply choice: the action whose expected successor scores best
/// for the mover.
#[derive(Clone, Debug)]
pub struct HeuristicPolicy<E> {
    evaluator: E,
}

impl<E> HeuristicPolicy<E> {
    #[must_use]
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }
}

impl<S: GameState, E: Evaluator<S>> RolloutPolicy<S> for HeuristicPolicy<E> {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn choose(&self, state: &S, actions: &[S::Action], _rng: &mut SearchRng) -> Result<S::Action> {
        ensure_actions(actions)?;
        if actions.len() == 1 {
            return Ok(actions[0].clone());
        }

        let mover = state.current_player();
        let mut best = 0;
        let mut best_value = f64::NEG_INFINITY;

        for (i, action) in actions.iter().enumerate() {
            let value: f64 = outcomes(state, action)?
                .iter()
                .map(|o| o.probability * self.evaluator.evaluate(&o.state, mover))
                .sum();
            if value > best_value {
                best = i;
                best_value = value;
            }
        }

        Ok(actions[best].clone())
    }
}

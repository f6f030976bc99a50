//! Static evaluation of game states.
//!
//! An `Evaluator` scores a state from one agent's perspective: higher is
//! better for the agent. Finished games always score `WIN_VALUE` or
//! `LOSS_VALUE`, so a real win or loss dominates any heuristic estimate.

pub mod value;

pub use value::{
    value_production, ValueFnConfig, ValueFnKind, ValueFunction, BASE_WEIGHTS, CONTENDER_WEIGHTS,
};

use crate::core::PlayerId;
use crate::game::GameState;

/// Score of a finished game the agent won.
pub const WIN_VALUE: f64 = f64::MAX;

/// Score of a finished game someone else won.
pub const LOSS_VALUE: f64 = f64::MIN;

/// Static state evaluator.
pub trait Evaluator<S: GameState> {
    /// Score `state` for `agent`. Must be pure and deterministic.
    fn evaluate(&self, state: &S, agent: PlayerId) -> f64;
}

/// Adapter turning a closure into an `Evaluator`.
#[derive(Clone, Copy, Debug)]
pub struct FnEvaluator<F>(pub F);

impl<S, F> Evaluator<S> for FnEvaluator<F>
where
    S: GameState,
    F: Fn(&S, PlayerId) -> f64,
{
    fn evaluate(&self, state: &S, agent: PlayerId) -> f64 {
        (self.0)(state, agent)
    }
}

/// Exact value of a finished game, `None` while running or on a draw.
pub fn terminal_value<S: GameState>(state: &S, agent: PlayerId) -> Option<f64> {
    if !state.is_terminal() {
        return None;
    }
    match state.winner() {
        Some(winner) if winner == agent => Some(WIN_VALUE),
        Some(_) => Some(LOSS_VALUE),
        None => None,
    }
}

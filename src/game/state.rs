//! The game-state contract consumed by both search engines.
//!
//! The engines never interpret game rules. They only:
//! - ask whose turn it is and which actions are legal
//! - derive successor states, possibly as a probability distribution
//! - ask whether the game is over and who won
//!
//! ## Implementation Notes
//!
//! - `apply` and `expand` take `&self` and return fresh states. A node's
//!   stored state is never aliased by another node, so implementations
//!   that share structure (e.g. `im` vectors, `Arc` boards) must copy on
//!   write.
//! - `expand` must return a distribution: at least one outcome,
//!   non-negative finite probabilities summing to 1.

use std::fmt::Debug;

use crate::core::{PlayerId, Result, SearchError, SearchRng};

/// Tolerance when checking that outcome probabilities sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// One possible result of taking an action.
#[derive(Clone, Debug)]
pub struct Outcome<S> {
    pub state: S,
    pub probability: f64,
}

impl<S> Outcome<S> {
    #[must_use]
    pub fn new(state: S, probability: f64) -> Self {
        Self { state, probability }
    }

    /// The single outcome of a deterministic action.
    #[must_use]
    pub fn certain(state: S) -> Self {
        Self::new(state, 1.0)
    }
}

/// Game-state contract.
pub trait GameState: Clone {
    /// Action type. Compared by value when filters reorder candidates.
    type Action: Clone + PartialEq + Debug;

    /// Seat whose decision this state represents.
    fn current_player(&self) -> PlayerId;

    /// Legal actions, in a stable order. Empty only if terminal.
    fn legal_actions(&self) -> Vec<Self::Action>;

    /// Apply an action, returning an independent successor.
    ///
    /// For stochastic actions this resolves chance however the game sees
    /// fit; the engines go through `expand` instead.
    fn apply(&self, action: &Self::Action) -> Self;

    fn is_terminal(&self) -> bool;

    /// Winner of a finished game. `None` while running or on a draw.
    fn winner(&self) -> Option<PlayerId>;

    /// Every outcome of `action` with its probability.
    fn expand(&self, action: &Self::Action) -> Vec<Outcome<Self>> {
        vec![Outcome::certain(self.apply(action))]
    }

    /// Whether `action` needs no deliberation (rolling dice, ending a turn).
    fn is_forced(&self, _action: &Self::Action) -> bool {
        false
    }
}

/// Expand `action` and check that the result is a distribution.
pub fn outcomes<S: GameState>(state: &S, action: &S::Action) -> Result<Vec<Outcome<S>>> {
    let outcomes = state.expand(action);
    let total: f64 = outcomes.iter().map(|o| o.probability).sum();

    let malformed = outcomes.is_empty()
        || outcomes
            .iter()
            .any(|o| !o.probability.is_finite() || o.probability < 0.0)
        || (total - 1.0).abs() > PROBABILITY_TOLERANCE;

    if malformed {
        return Err(SearchError::MalformedStochasticExpansion {
            outcomes: outcomes.len(),
            total,
        });
    }
    Ok(outcomes)
}

/// Resolve `action` to one successor, sampling outcomes by probability.
pub fn sample_outcome<S: GameState>(
    state: &S,
    action: &S::Action,
    rng: &mut SearchRng,
) -> Result<S> {
    let mut outcomes = outcomes(state, action)?;
    if outcomes.len() == 1 {
        return Ok(outcomes.swap_remove(0).state);
    }

    let weights: Vec<f64> = outcomes.iter().map(|o| o.probability).collect();
    let idx = rng
        .choose_weighted(&weights)
        .ok_or(SearchError::MalformedStochasticExpansion {
            outcomes: outcomes.len(),
            total: weights.iter().sum(),
        })?;
    Ok(outcomes.swap_remove(idx).state)
}

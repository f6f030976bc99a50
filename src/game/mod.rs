//! Game-state contract and board features.
//!
//! Games implement `GameState` to be searchable:
//! - whose turn it is and which actions are legal
//! - how actions produce successor states (possibly stochastic)
//! - when the game ends and who won
//!
//! Catan-style games additionally implement `BoardView` so heuristics and
//! value functions can read production, buildings and trade offers. The
//! engines never interpret game-specific concepts directly.

pub mod board;
pub mod state;

pub use board::{ActionFamily, BoardView, Resource, ResourceVector, TradeOffer};
pub use state::{outcomes, sample_outcome, GameState, Outcome, PROBABILITY_TOLERANCE};

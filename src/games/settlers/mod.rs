//! A compact Catan-like game.
//!
//! Played on a ring of resource tiles around a desert:
//! - snake-order opening placements, the second one paying out
//! - two-dice rolls (11 chance outcomes) producing resources
//! - robber on a 7 and knight cards, stealing one random card
//! - settlements, cities, roads, development cards and maritime trades
//! - longest road and largest army bonuses
//! - first to the target points wins; the turn cap ends the game in a draw
//!
//! Implements `GameState` and `BoardView`, so every engine, filter stage
//! and value function in the crate can run on it.

mod action;
mod board;
mod state;

pub use action::{
    SettlersAction, CITY_COST, DEVELOPMENT_CARD_COST, KNIGHT_PROBABILITY, ROAD_COST,
    SETTLEMENT_COST,
};
pub use board::{roll_probability, Board, Port, Spot, Tile};
pub use state::{
    Building, Phase, PlayerState, SettlersBuilder, SettlersState, HAND_LIMIT, LARGEST_ARMY_MIN,
    LONGEST_ROAD_MIN, MAX_CITIES, MAX_ROADS, MAX_SETTLEMENTS,
};

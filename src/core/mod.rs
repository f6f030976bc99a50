//! Core types shared by every engine: seats, randomness, errors.

pub mod error;
pub mod player;
pub mod rng;

pub use error::{Result, SearchError};
pub use player::{PlayerId, PlayerMap};
pub use rng::SearchRng;

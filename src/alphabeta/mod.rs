//! Expectimax Alpha-Beta search.
//!
//! Explores every filtered action to a fixed depth or until a wall-clock
//! deadline, scoring chance actions by the expected value of their
//! outcomes and the frontier with a static `Evaluator`. Nothing is kept
//! between decisions.
//!
//! ```rust
//! use std::time::Duration;
//! use catan_search::alphabeta::{AlphaBetaConfig, AlphaBetaSearch};
//! use catan_search::core::PlayerId;
//! use catan_search::games::tree::{scripted_evaluator, ScriptedGame};
//!
//! let game = ScriptedGame::uniform(2, 3, |leaf| leaf as f64);
//! let mut search = AlphaBetaSearch::new(AlphaBetaConfig::default(), scripted_evaluator());
//! let (action, value) = search
//!     .search_with_value(&game, PlayerId::new(0), 2, Duration::from_secs(1))
//!     .unwrap();
//! assert_eq!(value, 6.0);
//! # let _ = action;
//! ```

pub mod config;
pub mod search;
pub mod stats;

pub use config::{AlphaBetaConfig, DEFAULT_DEPTH, DEFAULT_MAX_TIME};
pub use search::{decide, AlphaBetaSearch};
pub use stats::AlphaBetaStats;

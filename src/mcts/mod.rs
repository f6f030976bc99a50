//! Monte Carlo Tree Search.
//!
//! ## Overview
//!
//! Sequential UCT over any `GameState`:
//!
//! - **Arena tree**: nodes live in a `Vec` and refer to each other by
//!   `NodeId`, so parent links are plain indices
//! - **Chance nodes**: stochastic actions are resolved by sampling one
//!   outcome per expansion
//! - **Configurable**: expansion order, reward perspective, rollout limit,
//!   rollout policy and action filter
//! - **Diagnostics**: `SearchStats`, `TreeStats`, `SearchTree::render`
//!
//! ## Usage
//!
//! ```rust
//! use catan_search::core::PlayerId;
//! use catan_search::games::tree::ScriptedGame;
//! use catan_search::mcts::{MctsConfig, MctsSearch};
//!
//! let game = ScriptedGame::uniform_decisive(3, 3, |leaf| if leaf == 4 { 1.0 } else { -1.0 });
//! let mut search = MctsSearch::new(MctsConfig::default().with_seed(7));
//!
//! let action = search.decide(&game, PlayerId::new(0), 500, 1.4).unwrap();
//! for (action, visits) in search.action_visits() {
//!     println!("{action:?}: {visits}");
//! }
//! # let _ = action;
//! ```
//!
//! For board games, `MctsSearch::for_board` wires in the configured
//! rollout policy and the exploration filter pipeline.

pub mod config;
pub mod node;
pub mod policy;
pub mod search;
pub mod stats;
pub mod tree;

pub use config::{ExpansionOrder, MctsConfig, RewardMode};
pub use node::{NodeId, SearchNode};
pub use policy::{playout_reward, select_child, SelectionPolicy, UCB1};
pub use search::MctsSearch;
pub use stats::SearchStats;
pub use tree::{SearchTree, TreeStats};

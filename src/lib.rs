//! # catan-search
//!
//! Game-tree search for Catan-style board games.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic Engines**: MCTS and Alpha-Beta only see the
//!    `GameState` contract. Board features live behind `BoardView`.
//!
//! 2. **Chance Is First-Class**: stochastic actions expand into weighted
//!    outcomes. MCTS samples one, Alpha-Beta takes the expectation.
//!
//! 3. **Configuration Over Globals**: every knob is an explicit,
//!    serializable config value. Runs are deterministic given a seed.
//!
//! ## Architecture
//!
//! - **Value Semantics**: `apply` returns a new state. Search branches own
//!   their copies; `im` vectors and `Arc` boards keep copies cheap.
//!
//! - **Heuristic Pruning**: action filters are a pipeline of named stages
//!   that can never empty or invent candidates.
//!
//! ## Modules
//!
//! - `core`: players, RNG, errors
//! - `game`: the `GameState` contract and `BoardView` features
//! - `heuristics`: action filters and filter pipelines
//! - `policy`: rollout policies
//! - `eval`: evaluators and the weighted value function
//! - `mcts`: Monte Carlo Tree Search
//! - `alphabeta`: depth- and time-limited expectimax Alpha-Beta
//! - `games`: scripted trees and a compact Catan-like game
//! - `agents`: agents and a game driver

pub mod core;
pub mod game;
pub mod heuristics;
pub mod policy;
pub mod eval;
pub mod mcts;
pub mod alphabeta;
pub mod games;
pub mod agents;

// Re-export commonly used types
pub use crate::core::{PlayerId, PlayerMap, Result, SearchError, SearchRng};

pub use crate::game::{
    outcomes, sample_outcome, ActionFamily, BoardView, GameState, Outcome, Resource,
    ResourceVector, TradeOffer,
};

pub use crate::heuristics::{ActionFilter, FilterPipeline, FilterStage, NoFilter};

pub use crate::policy::{
    ActionWeights, HeuristicPolicy, PolicyKind, RandomPolicy, RolloutPolicy, WeightedPolicy,
};

pub use crate::eval::{
    Evaluator, FnEvaluator, ValueFnConfig, ValueFnKind, ValueFunction, LOSS_VALUE, WIN_VALUE,
};

pub use crate::mcts::{
    ExpansionOrder, MctsConfig, MctsSearch, NodeId, RewardMode, SearchNode, SearchStats,
    SearchTree, SelectionPolicy, TreeStats, UCB1,
};

pub use crate::alphabeta::{AlphaBetaConfig, AlphaBetaSearch, AlphaBetaStats};

pub use crate::agents::{
    play_game, Agent, AlphaBetaAgent, GameRecord, MctsAgent, PolicyAgent, RandomAgent,
};

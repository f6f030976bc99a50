//! MCTS search nodes.
//!
//! Nodes live in an arena (`SearchTree`) and refer to each other by
//! `NodeId` index, so the parent link is a plain non-owning index.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::game::GameState;

/// Index into the `SearchTree` node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// One explored game state.
#[derive(Clone, Debug)]
pub struct SearchNode<S: GameState> {
    /// State reached at this node. Owned exclusively by the node.
    pub state: S,

    /// Parent node (NONE for root).
    pub parent: NodeId,

    /// Expanded children in creation order.
    pub children: Vec<NodeId>,

    pub visits: u32,

    /// Sum of playout rewards credited to this node.
    pub reward: f64,

    /// Action taken from the parent (None for root).
    pub action: Option<S::Action>,

    /// Filtered legal actions not expanded yet.
    pub untried: Vec<S::Action>,

    /// Player to move at this node.
    pub to_move: PlayerId,

    /// Depth in tree (root = 0).
    pub depth: u16,

    pub terminal: bool,
}

impl<S: GameState> SearchNode<S> {
    /// Create a node for `state`. `untried` should already be filtered.
    pub fn new(
        state: S,
        parent: NodeId,
        action: Option<S::Action>,
        untried: Vec<S::Action>,
        depth: u16,
    ) -> Self {
        let to_move = state.current_player();
        let terminal = state.is_terminal();
        Self {
            state,
            parent,
            children: Vec::new(),
            visits: 0,
            reward: 0.0,
            action,
            untried: if terminal { Vec::new() } else { untried },
            to_move,
            depth,
            terminal,
        }
    }

    /// Create a root node.
    pub fn root(state: S, untried: Vec<S::Action>) -> Self {
        Self::new(state, NodeId::NONE, None, untried, 0)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// No untried actions remain.
    #[must_use]
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    #[must_use]
    pub fn mean_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward / self.visits as f64
        }
    }
}

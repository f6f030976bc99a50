//! Arena-based MCTS tree.
//!
//! Uses a flat `Vec<SearchNode>` with index-based references, so the
//! child-to-parent link needs no reference counting and ancestor walks
//! stay O(1) per step.

use std::fmt::Write;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::node::{NodeId, SearchNode};
use super::policy::{SelectionPolicy, UCB1};
use crate::core::PlayerId;
use crate::game::GameState;

/// Arena-based MCTS tree for one decision.
#[derive(Clone, Debug)]
pub struct SearchTree<S: GameState> {
    /// All nodes in the tree.
    nodes: Vec<SearchNode<S>>,

    /// The root node ID (always 0).
    root: NodeId,

    /// Seat the search runs for. Fixed for the whole tree.
    agent: PlayerId,
}

impl<S: GameState> SearchTree<S> {
    /// Create a tree around a root node.
    pub fn new(root: SearchNode<S>, agent: PlayerId) -> Self {
        let mut nodes = Vec::with_capacity(1024);
        nodes.push(root);
        Self {
            nodes,
            root: NodeId::new(0),
            agent,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn agent(&self) -> PlayerId {
        self.agent
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &SearchNode<S> {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode<S> {
        &mut self.nodes[id.0 as usize]
    }

    #[must_use]
    pub fn root_node(&self) -> &SearchNode<S> {
        self.get(self.root)
    }

    /// Allocate `child` under `parent`, returning its ID.
    pub fn add_child(&mut self, parent: NodeId, child: SearchNode<S>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(child);
        self.get_mut(parent).children.push(id);
        id
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SearchNode<S>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::new(i as u32), n))
    }

    /// Root child with the most visits; first-seen on ties.
    #[must_use]
    pub fn most_visited_child(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None;
        for &child in &self.root_node().children {
            let visits = self.get(child).visits;
            if best.map_or(true, |(_, v)| visits > v) {
                best = Some((child, visits));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Visits and reward of every node, summed per key of the action that
    /// led to it.
    pub fn action_stats<K, F>(&self, key: F) -> FxHashMap<K, (u32, f64)>
    where
        K: Eq + Hash,
        F: Fn(&S::Action) -> K,
    {
        let mut stats: FxHashMap<K, (u32, f64)> = FxHashMap::default();
        for node in &self.nodes {
            if let Some(action) = &node.action {
                let entry = stats.entry(key(action)).or_insert((0, 0.0));
                entry.0 += node.visits;
                entry.1 += node.reward;
            }
        }
        stats
    }

    /// Get statistics about the tree.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            node_count: self.nodes.len(),
            max_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
            terminal_count: self.nodes.iter().filter(|n| n.terminal).count(),
            expanded_edges: self.nodes.len().saturating_sub(1),
            untried_edges: self.nodes.iter().map(|n| n.untried.len()).sum(),
        }
    }

    /// Pretty-print the tree.
    ///
    /// `max_depth` counts levels below the root: `Some(0)` prints the root
    /// only, `None` prints everything.
    #[must_use]
    pub fn render(&self, max_depth: Option<usize>, exploration: f64) -> String {
        let root = self.root_node();
        let mut out = String::new();

        let _ = write!(
            out,
            "MCTS Root ({} perspective) [Total W/V: {}/{}] (Current Turn: {})",
            self.agent, root.reward, root.visits, root.to_move
        );
        if root.terminal {
            out.push_str(" (Terminal State)");
        }
        out.push('\n');

        if max_depth == Some(0) {
            if !root.children.is_empty() {
                out.push_str("└── ... (children not printed, max_depth = 0)\n");
            }
            return out;
        }

        let count = root.children.len();
        for (i, &child) in root.children.iter().enumerate() {
            self.render_node(&mut out, child, "", i + 1 == count, 1, max_depth, exploration);
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn render_node(
        &self,
        out: &mut String,
        id: NodeId,
        prefix: &str,
        last: bool,
        depth: usize,
        max_depth: Option<usize>,
        exploration: f64,
    ) {
        let node = self.get(id);
        let parent_visits = self.get(node.parent).visits;
        let score = UCB1.score(node.reward, node.visits, parent_visits, exploration);

        let _ = write!(
            out,
            "{prefix}{}Act: {:?} [W/V: {}/{} for {}, UCB1: {:.3}] (Turn: {})",
            if last { "└── " } else { "├── " },
            node.action,
            node.reward,
            node.visits,
            self.agent,
            score,
            node.to_move
        );
        if node.terminal {
            out.push_str(" (Terminal)");
        } else if node.children.is_empty() {
            if node.is_fully_expanded() {
                out.push_str(" (Leaf - Fully Expanded)");
            } else {
                out.push_str(" (Leaf - Not Fully Expanded)");
            }
        }
        out.push('\n');

        let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
        if max_depth.map_or(false, |max| depth >= max) {
            if !node.children.is_empty() {
                let _ = writeln!(out, "{child_prefix}└── ... (depth limit reached)");
            }
            return;
        }

        let count = node.children.len();
        for (i, &child) in node.children.iter().enumerate() {
            self.render_node(out, child, &child_prefix, i + 1 == count, depth + 1, max_depth, exploration);
        }
    }
}

/// Statistics about the MCTS tree.
#[derive(Clone, Debug, Default)]
pub struct TreeStats {
    pub node_count: usize,

    pub max_depth: u16,

    pub terminal_count: usize,

    /// Actions expanded into nodes.
    pub expanded_edges: usize,

    /// Actions still waiting in `untried` lists.
    pub untried_edges: usize,
}

impl TreeStats {
    /// Expanded actions over all known actions.
    #[must_use]
    pub fn expansion_ratio(&self) -> f64 {
        let total = self.expanded_edges + self.untried_edges;
        if total == 0 {
            0.0
        } else {
            self.expanded_edges as f64 / total as f64
        }
    }
}

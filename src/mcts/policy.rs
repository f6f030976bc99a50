//! Tree policy: how selection walks down an expanded tree, and how a
//! finished playout is turned into a reward.

use crate::core::PlayerId;
use crate::game::GameState;

use super::node::NodeId;
use super::tree::SearchTree;

/// Scores a child during selection. Higher is better.
pub trait SelectionPolicy {
    fn score(&self, reward: f64, visits: u32, parent_visits: u32, exploration: f64) -> f64;
}

/// UCB1 (Upper Confidence Bound).
///
/// Balances exploitation (high reward) with exploration (low visits).
/// Formula: W/V + c * sqrt(ln(N) / V). Unvisited children score +inf.
#[derive(Clone, Copy, Debug, Default)]
pub struct UCB1;

impl SelectionPolicy for UCB1 {
    fn score(&self, reward: f64, visits: u32, parent_visits: u32, exploration: f64) -> f64 {
        if visits == 0 {
            return f64::INFINITY;
        }
        let visits = visits as f64;
        let ln_parent = (parent_visits.max(1) as f64).ln();
        reward / visits + exploration * (ln_parent / visits).sqrt()
    }
}

/// Child of `node` with the highest score; the first-seen child wins ties.
///
/// Returns `None` when `node` has no children.
pub fn select_child<S: GameState>(
    tree: &SearchTree<S>,
    node: NodeId,
    policy: &dyn SelectionPolicy,
    exploration: f64,
) -> Option<NodeId> {
    let parent = tree.get(node);
    let mut best: Option<(NodeId, f64)> = None;

    for &child in &parent.children {
        let c = tree.get(child);
        let score = policy.score(c.reward, c.visits, parent.visits, exploration);
        // Strict comparison keeps the earliest child among equals.
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((child, score));
        }
    }

    best.map(|(id, _)| id)
}

/// 1.0 when `credited` won the playout, 0.0 on a loss or a draw.
#[inline]
#[must_use]
pub fn playout_reward(winner: Option<PlayerId>, credited: PlayerId) -> f64 {
    if winner == Some(credited) {
        1.0
    } else {
        0.0
    }
}

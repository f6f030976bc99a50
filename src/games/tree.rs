//! Explicit game trees for exercising the engines.
//!
//! A `ScriptedGame` is a cursor into a fixed tree: every node names its
//! mover, a static score and its branches, and every branch lists its
//! outcomes with probabilities. Leaves are terminal and may name a winner.
//! Scores are from player 0's point of view.
//!
//! ```rust
//! use catan_search::core::PlayerId;
//! use catan_search::game::GameState;
//! use catan_search::games::tree::{Branch, TreeAction, TreeBuilder};
//!
//! let mut b = TreeBuilder::new();
//! let heads = b.leaf(1.0, Some(PlayerId::new(0)));
//! let tails = b.leaf(-1.0, Some(PlayerId::new(1)));
//! let root = b.decision(PlayerId::new(0), 0.0, vec![Branch::chance(vec![(heads, 0.5), (tails, 0.5)])]);
//! let game = b.build(root);
//!
//! assert_eq!(game.legal_actions(), vec![TreeAction(0)]);
//! assert_eq!(game.expand(&TreeAction(0)).len(), 2);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::eval::{terminal_value, Evaluator};
use crate::game::{GameState, Outcome};

/// Index of a branch at the current node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeAction(pub usize);

/// One action's outcomes as `(node, probability)` pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    outcomes: Vec<(usize, f64)>,
}

impl Branch {
    /// Deterministic move to `node`.
    #[must_use]
    pub fn to(node: usize) -> Self {
        Self {
            outcomes: vec![(node, 1.0)],
        }
    }

    /// Chance move. Probabilities are taken as given.
    #[must_use]
    pub fn chance(outcomes: Vec<(usize, f64)>) -> Self {
        Self { outcomes }
    }
}

#[derive(Clone, Debug)]
struct ScriptNode {
    mover: PlayerId,
    score: f64,
    branches: Vec<Branch>,
    winner: Option<PlayerId>,
}

/// Builds the node table of a `ScriptedGame`.
#[derive(Clone, Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<ScriptNode>,
}

impl TreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal node. `winner: None` is a draw.
    pub fn leaf(&mut self, score: f64, winner: Option<PlayerId>) -> usize {
        self.push(ScriptNode {
            mover: PlayerId::new(0),
            score,
            branches: Vec::new(),
            winner,
        })
    }

    /// Node where `mover` picks one of `branches`.
    pub fn decision(&mut self, mover: PlayerId, score: f64, branches: Vec<Branch>) -> usize {
        self.push(ScriptNode {
            mover,
            score,
            branches,
            winner: None,
        })
    }

    /// Finish the table, starting play at `root`.
    #[must_use]
    pub fn build(self, root: usize) -> ScriptedGame {
        ScriptedGame {
            nodes: Arc::new(self.nodes),
            node: root,
        }
    }

    fn push(&mut self, node: ScriptNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// Position in a scripted game tree. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ScriptedGame {
    nodes: Arc<Vec<ScriptNode>>,
    node: usize,
}

impl ScriptedGame {
    /// Complete two-player tree of the given depth and branching factor.
    ///
    /// Player 0 moves at even depths, player 1 at odd depths. Leaves are
    /// draws scored by `leaf_score(k)`, `k` counting leaves left to right;
    /// internal nodes score 0.
    pub fn uniform(depth: usize, branching: usize, leaf_score: impl Fn(usize) -> f64) -> Self {
        Self::complete(depth, branching, |k| (leaf_score(k), None))
    }

    /// Like `uniform`, but a positive leaf is won by player 0 and a
    /// negative one by player 1.
    pub fn uniform_decisive(depth: usize, branching: usize, leaf_score: impl Fn(usize) -> f64) -> Self {
        Self::complete(depth, branching, |k| {
            let score = leaf_score(k);
            let winner = if score > 0.0 {
                Some(PlayerId::new(0))
            } else if score < 0.0 {
                Some(PlayerId::new(1))
            } else {
                None
            };
            (score, winner)
        })
    }

    fn complete(
        depth: usize,
        branching: usize,
        leaf: impl Fn(usize) -> (f64, Option<PlayerId>),
    ) -> Self {
        fn grow(
            b: &mut TreeBuilder,
            level: usize,
            depth: usize,
            branching: usize,
            leaves: &mut usize,
            leaf: &dyn Fn(usize) -> (f64, Option<PlayerId>),
        ) -> usize {
            if level == depth {
                let (score, winner) = leaf(*leaves);
                *leaves += 1;
                let id = b.leaf(score, winner);
                b.nodes[id].mover = PlayerId::new((level % 2) as u8);
                return id;
            }
            let branches = (0..branching)
                .map(|_| Branch::to(grow(b, level + 1, depth, branching, leaves, leaf)))
                .collect();
            b.decision(PlayerId::new((level % 2) as u8), 0.0, branches)
        }

        let mut b = TreeBuilder::new();
        let mut leaves = 0;
        let root = grow(&mut b, 0, depth, branching, &mut leaves, &leaf);
        b.build(root)
    }

    /// Replace the static score of every internal node reachable from the
    /// current one. `score` receives the action path from here.
    #[must_use]
    pub fn with_static_scores(mut self, score: impl Fn(&[usize]) -> f64) -> Self {
        let mut nodes = (*self.nodes).clone();
        let mut stack = vec![(self.node, Vec::new())];

        while let Some((id, path)) = stack.pop() {
            if nodes[id].branches.is_empty() {
                continue;
            }
            nodes[id].score = score(&path);
            for (i, branch) in nodes[id].branches.iter().enumerate() {
                for &(child, _) in &branch.outcomes {
                    let mut child_path = path.clone();
                    child_path.push(i);
                    stack.push((child, child_path));
                }
            }
        }

        self.nodes = Arc::new(nodes);
        self
    }

    /// Static score of the current node, from player 0's point of view.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.current().score
    }

    /// Index of the current node in the table.
    #[must_use]
    pub fn node_index(&self) -> usize {
        self.node
    }

    fn current(&self) -> &ScriptNode {
        &self.nodes[self.node]
    }

    fn at(&self, node: usize) -> Self {
        Self {
            nodes: Arc::clone(&self.nodes),
            node,
        }
    }
}

impl GameState for ScriptedGame {
    type Action = TreeAction;

    fn current_player(&self) -> PlayerId {
        self.current().mover
    }

    fn legal_actions(&self) -> Vec<TreeAction> {
        (0..self.current().branches.len()).map(TreeAction).collect()
    }

    /// Follows the first outcome of the branch.
    fn apply(&self, action: &TreeAction) -> Self {
        match self.current().branches.get(action.0).and_then(|b| b.outcomes.first()) {
            Some(&(node, _)) => self.at(node),
            None => self.clone(),
        }
    }

    fn is_terminal(&self) -> bool {
        self.current().branches.is_empty()
    }

    fn winner(&self) -> Option<PlayerId> {
        if self.is_terminal() {
            self.current().winner
        } else {
            None
        }
    }

    fn expand(&self, action: &TreeAction) -> Vec<Outcome<Self>> {
        match self.current().branches.get(action.0) {
            Some(branch) => branch
                .outcomes
                .iter()
                .map(|&(node, p)| Outcome::new(self.at(node), p))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Evaluates scripted positions: exact values for decided leaves, else
/// the node score (negated for every agent but player 0).
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptedEvaluator;

impl Evaluator<ScriptedGame> for ScriptedEvaluator {
    fn evaluate(&self, state: &ScriptedGame, agent: PlayerId) -> f64 {
        terminal_value(state, agent).unwrap_or_else(|| {
            if agent == PlayerId::new(0) {
                state.score()
            } else {
                -state.score()
            }
        })
    }
}

#[must_use]
pub fn scripted_evaluator() -> ScriptedEvaluator {
    ScriptedEvaluator
}

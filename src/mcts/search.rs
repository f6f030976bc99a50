//! Core MCTS search algorithm.
//!
//! Each playout walks the arena tree with UCB1, grows it by one node,
//! finishes the game with a rollout policy and credits the result back up
//! to the root. The tree lives for one decision only.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::core::{PlayerId, Result, SearchError, SearchRng};
use crate::game::{sample_outcome, BoardView, GameState};
use crate::heuristics::{ActionFilter, FilterPipeline, NoFilter};
use crate::policy::{PolicyKind, RandomPolicy, RolloutPolicy};

use super::config::{ExpansionOrder, MctsConfig, RewardMode};
use super::node::{NodeId, SearchNode};
use super::policy::{playout_reward, select_child, SelectionPolicy, UCB1};
use super::stats::SearchStats;
use super::tree::SearchTree;

/// Main MCTS search context.
///
/// Owns the configuration, the RNG and the policies. The tree of the last
/// search is kept for inspection until the next one starts.
pub struct MctsSearch<S: GameState> {
    config: MctsConfig,

    /// Tree built by the last `run`.
    tree: Option<SearchTree<S>>,

    rng: SearchRng,

    selection: Box<dyn SelectionPolicy>,

    rollout: Box<dyn RolloutPolicy<S>>,

    /// Applied to the legal actions of every new node.
    filter: Box<dyn ActionFilter<S>>,

    stats: SearchStats,
}

impl<S: GameState> MctsSearch<S> {
    /// Create a search with UCB1 selection, random rollouts and no filter.
    pub fn new(config: MctsConfig) -> Self {
        let rng = SearchRng::new(config.seed);
        Self {
            config,
            tree: None,
            rng,
            selection: Box::new(UCB1),
            rollout: Box::new(RandomPolicy),
            filter: Box::new(NoFilter),
            stats: SearchStats::default(),
        }
    }

    /// Set a custom selection policy.
    pub fn with_selection<P: SelectionPolicy + 'static>(mut self, selection: P) -> Self {
        self.selection = Box::new(selection);
        self
    }

    /// Set the rollout policy.
    pub fn with_rollout<P: RolloutPolicy<S> + 'static>(mut self, rollout: P) -> Self {
        self.rollout = Box::new(rollout);
        self
    }

    /// Set the action filter used when nodes are created.
    pub fn with_filter<F: ActionFilter<S> + 'static>(mut self, filter: F) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Run exactly `n_simulations` playouts from `root` for `agent`.
    ///
    /// Fails with `InvalidSearchStart` when the root is terminal or has no
    /// legal actions.
    pub fn run(&mut self, root: &S, agent: PlayerId, n_simulations: u32) -> Result<()> {
        let legal = Self::root_actions(root)?;
        let candidates = self.filter.filter(root, legal, &mut self.rng)?;
        let c = self.config.exploration_constant;
        self.grow(root, agent, candidates, n_simulations, c)
    }

    /// Most visited root child of the last search; first-seen on ties.
    pub fn best_action(&self) -> Result<S::Action> {
        let tree = self.tree.as_ref().ok_or(SearchError::EmptySearchSpace)?;
        let best = tree.most_visited_child().ok_or(SearchError::EmptySearchSpace)?;
        tree.get(best).action.clone().ok_or(SearchError::EmptySearchSpace)
    }

    /// `run` followed by `best_action`.
    pub fn search(&mut self, root: &S, agent: PlayerId, n_simulations: u32) -> Result<S::Action> {
        self.run(root, agent, n_simulations)?;
        self.best_action()
    }

    /// Pick an action for `agent` at `root`.
    ///
    /// With zero simulations this is a uniformly random legal action. When
    /// fast-forward is enabled, a single candidate or an all-forced action
    /// list is answered without searching. An empty search space falls
    /// back to a random legal action. `exploration_constant` applies to
    /// this decision only; the configured one is left as is.
    pub fn decide(
        &mut self,
        root: &S,
        agent: PlayerId,
        n_simulations: u32,
        exploration_constant: f64,
    ) -> Result<S::Action> {
        let legal = Self::root_actions(root)?;

        if n_simulations == 0 {
            self.tree = None;
            return self.random_action(&legal);
        }

        if self.config.fast_forward && legal.iter().all(|a| root.is_forced(a)) {
            trace!(actions = legal.len(), "all actions forced; skipping search");
            self.tree = None;
            return Ok(legal[0].clone());
        }

        let candidates = self.filter.filter(root, legal.clone(), &mut self.rng)?;
        if self.config.fast_forward && candidates.len() == 1 {
            trace!("single candidate; skipping search");
            self.tree = None;
            return Ok(candidates[0].clone());
        }

        self.grow(root, agent, candidates, n_simulations, exploration_constant)?;
        match self.best_action() {
            Err(SearchError::EmptySearchSpace) => {
                warn!(%agent, "search produced no root children; choosing at random");
                self.random_action(&legal)
            }
            result => result,
        }
    }

    /// Visit count of every root child, in expansion order.
    pub fn action_visits(&self) -> Vec<(S::Action, u32)> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        tree.root_node()
            .children
            .iter()
            .filter_map(|&id| {
                let node = tree.get(id);
                node.action.clone().map(|a| (a, node.visits))
            })
            .collect()
    }

    #[must_use]
    pub fn tree(&self) -> Option<&SearchTree<S>> {
        self.tree.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    #[must_use]
    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    fn root_actions(root: &S) -> Result<Vec<S::Action>> {
        if root.is_terminal() {
            return Err(SearchError::InvalidSearchStart("root state is terminal"));
        }
        let legal = root.legal_actions();
        if legal.is_empty() {
            return Err(SearchError::InvalidSearchStart("root state has no legal actions"));
        }
        Ok(legal)
    }

    fn random_action(&mut self, legal: &[S::Action]) -> Result<S::Action> {
        self.rng
            .choose(legal)
            .cloned()
            .ok_or(SearchError::InvalidSearchStart("root state has no legal actions"))
    }

    /// Build a fresh tree over the filtered root `candidates`, selecting
    /// with exploration constant `c`.
    fn grow(
        &mut self,
        root: &S,
        agent: PlayerId,
        candidates: Vec<S::Action>,
        n_simulations: u32,
        c: f64,
    ) -> Result<()> {
        let start = Instant::now();
        self.stats.reset();
        self.tree = None;

        let untried = self.expansion_order(candidates);
        let mut tree = SearchTree::new(SearchNode::root(root.clone(), untried), agent);

        for i in 0..n_simulations {
            let leaf = self.playout(&mut tree, c)?;
            trace!(playout = i, leaf = %leaf, nodes = tree.len(), "playout finished");
        }

        self.stats.time_us = start.elapsed().as_micros() as u64;
        debug!(
            %agent,
            playouts = self.stats.playouts,
            nodes = tree.len(),
            max_depth = self.stats.max_depth,
            time_us = self.stats.time_us,
            "mcts search finished"
        );

        self.tree = Some(tree);
        Ok(())
    }

    /// One playout: select, expand, simulate, backpropagate.
    ///
    /// Returns the node the rollout started from.
    fn playout(&mut self, tree: &mut SearchTree<S>, c: f64) -> Result<NodeId> {
        // === SELECTION ===
        let mut current = tree.root();
        loop {
            let node = tree.get(current);
            if node.terminal || !node.is_fully_expanded() {
                break;
            }
            match select_child(tree, current, self.selection.as_ref(), c) {
                Some(child) => current = child,
                None => break,
            }
        }

        // === EXPANSION ===
        if !tree.get(current).terminal {
            if let Some(action) = tree.get_mut(current).untried.pop() {
                let state = sample_outcome(&tree.get(current).state, &action, &mut self.rng)?;
                let candidates = if state.is_terminal() {
                    Vec::new()
                } else {
                    let legal = state.legal_actions();
                    self.filter.filter(&state, legal, &mut self.rng)?
                };
                let untried = self.expansion_order(candidates);
                let depth = tree.get(current).depth + 1;

                current = tree.add_child(
                    current,
                    SearchNode::new(state, current, Some(action), untried, depth),
                );
                self.stats.nodes_expanded += 1;
                self.stats.max_depth = self.stats.max_depth.max(depth);
            }
        }

        // === SIMULATION ===
        let winner = self.simulate(tree.get(current).state.clone())?;

        // === BACKPROPAGATION ===
        self.backpropagate(tree, current, winner);
        self.stats.playouts += 1;

        Ok(current)
    }

    /// Arrange candidates so that `pop` yields them in the configured order.
    fn expansion_order(&mut self, mut actions: Vec<S::Action>) -> Vec<S::Action> {
        match self.config.expansion_order {
            ExpansionOrder::Lifo => {}
            ExpansionOrder::Fifo => actions.reverse(),
            ExpansionOrder::Shuffled => self.rng.shuffle(&mut actions),
        }
        actions
    }

    /// Play the rollout policy to the end of the game.
    ///
    /// Returns the winner, or `None` on a draw or a truncated rollout.
    fn simulate(&mut self, mut state: S) -> Result<Option<PlayerId>> {
        let mut rng = self.rng.fork();
        let limit = self.config.rollout_limit;
        let mut steps = 0u32;

        let winner = loop {
            if state.is_terminal() {
                break state.winner();
            }
            if limit > 0 && steps >= limit {
                self.stats.truncated_rollouts += 1;
                break None;
            }

            let actions = state.legal_actions();
            if actions.is_empty() {
                break None;
            }

            let action = self.rollout.choose(&state, &actions, &mut rng)?;
            state = sample_outcome(&state, &action, &mut rng)?;
            steps += 1;
        };

        self.stats.rollout_steps += u64::from(steps);
        Ok(winner)
    }

    /// Credit the playout result to `leaf` and all its ancestors.
    fn backpropagate(&self, tree: &mut SearchTree<S>, leaf: NodeId, winner: Option<PlayerId>) {
        let agent = tree.agent();
        let mut current = leaf;

        while !current.is_none() {
            let parent = tree.get(current).parent;
            let credited = match self.config.reward_mode {
                RewardMode::FixedAgent => agent,
                RewardMode::MoverRelative if parent.is_none() => agent,
                RewardMode::MoverRelative => tree.get(parent).to_move,
            };

            let node = tree.get_mut(current);
            node.visits += 1;
            node.reward += playout_reward(winner, credited);
            current = parent;
        }
    }
}

impl<S: BoardView> MctsSearch<S> {
    /// Search set up for board games: the configured rollout policy and
    /// the exploration filter pipeline.
    pub fn for_board(config: MctsConfig, policy: &PolicyKind) -> Result<Self>
    where
        S: 'static,
    {
        let mut search = Self::new(config).with_filter(FilterPipeline::<S>::exploration());
        search.rollout = policy.build()?;
        Ok(search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tree::{Branch, ScriptedGame, TreeAction, TreeBuilder};

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);

    /// Root for P0 with three moves: only the middle one wins.
    fn one_winning_move() -> ScriptedGame {
        let mut b = TreeBuilder::new();
        let lose_a = b.leaf(-1.0, Some(P1));
        let win = b.leaf(1.0, Some(P0));
        let lose_b = b.leaf(-1.0, Some(P1));
        let root = b.decision(P0, 0.0, vec![Branch::to(lose_a), Branch::to(win), Branch::to(lose_b)]);
        b.build(root)
    }

    #[test]
    fn test_root_visits_match_playouts() {
        let game = ScriptedGame::uniform_decisive(3, 3, |i| if i % 2 == 0 { 1.0 } else { -1.0 });
        let mut search = MctsSearch::new(MctsConfig::default());
        search.run(&game, P0, 200).unwrap();

        let tree = search.tree().unwrap();
        let root = tree.root_node();
        let child_visits: u32 = root.children.iter().map(|&c| tree.get(c).visits).sum();

        assert_eq!(root.visits, 200);
        assert_eq!(child_visits, 200);
        assert_eq!(search.stats().playouts, 200);
    }

    #[test]
    fn test_fewer_playouts_than_actions() {
        let game = ScriptedGame::uniform(1, 3, |_| 1.0);
        let mut search = MctsSearch::new(MctsConfig::default());
        search.run(&game, P0, 2).unwrap();

        // LIFO expansion: last action first.
        let visits = search.action_visits();
        assert_eq!(visits, vec![(TreeAction(2), 1), (TreeAction(1), 1)]);
        assert_eq!(search.best_action().unwrap(), TreeAction(2));
    }

    #[test]
    fn test_fifo_expansion_order() {
        let game = ScriptedGame::uniform(1, 3, |_| 1.0);
        let config = MctsConfig::default().with_expansion_order(ExpansionOrder::Fifo);
        let mut search = MctsSearch::new(config);
        search.run(&game, P0, 2).unwrap();

        let actions: Vec<TreeAction> = search.action_visits().into_iter().map(|(a, _)| a).collect();
        assert_eq!(actions, vec![TreeAction(0), TreeAction(1)]);
    }

    #[test]
    fn test_finds_winning_move() {
        let game = one_winning_move();
        let mut search = MctsSearch::new(MctsConfig::default());
        let action = search.search(&game, P0, 300).unwrap();
        assert_eq!(action, TreeAction(1));
    }

    #[test]
    fn test_deterministic_with_seed() {
        let game = ScriptedGame::uniform_decisive(3, 3, |i| if i % 3 == 0 { 1.0 } else { -1.0 });
        let config = MctsConfig::default()
            .with_seed(12345)
            .with_expansion_order(ExpansionOrder::Shuffled);

        let mut a = MctsSearch::new(config.clone());
        let mut b = MctsSearch::new(config);
        a.run(&game, P0, 150).unwrap();
        b.run(&game, P0, 150).unwrap();

        assert_eq!(a.action_visits(), b.action_visits());
        assert_eq!(a.best_action().unwrap(), b.best_action().unwrap());
    }

    #[test]
    fn test_terminal_root_rejected() {
        let game = ScriptedGame::uniform(1, 2, |_| 1.0).apply(&TreeAction(0));
        let mut search = MctsSearch::new(MctsConfig::default());

        assert!(matches!(
            search.decide(&game, P0, 10, 1.4),
            Err(SearchError::InvalidSearchStart(_))
        ));
        assert!(matches!(
            search.run(&game, P0, 10),
            Err(SearchError::InvalidSearchStart(_))
        ));
    }

    #[test]
    fn test_zero_simulations_builds_no_tree() {
        let game = ScriptedGame::uniform(2, 4, |_| 0.0);
        let mut search = MctsSearch::new(MctsConfig::default());
        let action = search.decide(&game, P0, 0, 1.4).unwrap();

        assert!(game.legal_actions().contains(&action));
        assert!(search.tree().is_none());
    }

    #[test]
    fn test_fast_forward_single_action() {
        let game = ScriptedGame::uniform(2, 1, |_| 0.0);
        let mut search = MctsSearch::new(MctsConfig::default());
        assert_eq!(search.decide(&game, P0, 100, 1.4).unwrap(), TreeAction(0));
        assert!(search.tree().is_none());

        let mut slow = MctsSearch::new(MctsConfig::default().with_fast_forward(false));
        assert_eq!(slow.decide(&game, P0, 10, 1.4).unwrap(), TreeAction(0));
        assert_eq!(slow.tree().unwrap().root_node().visits, 10);
    }

    #[test]
    fn test_best_action_without_search() {
        let search: MctsSearch<ScriptedGame> = MctsSearch::new(MctsConfig::default());
        assert_eq!(search.best_action(), Err(SearchError::EmptySearchSpace));
    }

    #[test]
    fn test_rollout_limit_truncates() {
        let game = ScriptedGame::uniform_decisive(6, 2, |_| 1.0);
        let config = MctsConfig::default().with_rollout_limit(1);
        let mut search = MctsSearch::new(config);
        search.run(&game, P0, 20).unwrap();

        assert!(search.stats().truncated_rollouts > 0);
        // Every leaf is a P0 win, so rewards only come from full rollouts.
        let root = search.tree().unwrap().root_node();
        assert!(root.reward < root.visits as f64);
    }

    #[test]
    fn test_truncated_rollouts_count_their_steps() {
        let game = ScriptedGame::uniform_decisive(6, 2, |_| 1.0);
        let config = MctsConfig::default().with_rollout_limit(2);
        let mut search = MctsSearch::new(config);
        search.run(&game, P0, 14).unwrap();

        let stats = search.stats();
        assert!(stats.truncated_rollouts > 0);
        assert!(stats.rollout_steps >= 2 * u64::from(stats.truncated_rollouts));
    }

    #[test]
    fn test_decide_leaves_configured_exploration() {
        let game = ScriptedGame::uniform(2, 3, |i| i as f64);
        let mut search = MctsSearch::new(MctsConfig::default().with_exploration(2.0));
        search.decide(&game, P0, 40, 0.3).unwrap();
        assert_eq!(search.config().exploration_constant, 2.0);
    }

    #[test]
    fn test_reward_modes() {
        // Every leaf is a win for P1; P1 moves at depth 1.
        let game = ScriptedGame::uniform_decisive(2, 2, |_| -1.0);

        let mut fixed = MctsSearch::new(MctsConfig::default());
        fixed.run(&game, P0, 30).unwrap();
        assert!(fixed.tree().unwrap().iter().all(|(_, n)| n.reward == 0.0));

        let config = MctsConfig::default().with_reward_mode(RewardMode::MoverRelative);
        let mut relative = MctsSearch::new(config);
        relative.run(&game, P0, 30).unwrap();

        let tree = relative.tree().unwrap();
        assert_eq!(tree.root_node().reward, 0.0);
        for (_, node) in tree.iter() {
            match node.depth {
                1 => assert_eq!(node.reward, 0.0),
                2 => assert_eq!(node.reward, node.visits as f64),
                _ => {}
            }
        }
    }
}

//! Depth- and deadline-bounded expectimax with alpha-beta cutoffs.
//!
//! Stochastic actions are scored by the probability-weighted value of
//! their outcomes. The alpha/beta window is handed to every outcome
//! subtree unchanged, so with chance nodes the cutoffs are a heuristic;
//! on deterministic trees they never change the answer.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::core::{PlayerId, Result, SearchError, SearchRng};
use crate::eval::{Evaluator, ValueFnConfig};
use crate::game::{outcomes, BoardView, GameState};
use crate::heuristics::{ActionFilter, FilterPipeline, NoFilter};

use super::config::AlphaBetaConfig;
use super::stats::AlphaBetaStats;

/// Alpha-Beta search context.
///
/// Keeps nothing between decisions except its configuration, RNG and the
/// statistics of the last call.
pub struct AlphaBetaSearch<S: GameState> {
    config: AlphaBetaConfig,

    evaluator: Box<dyn Evaluator<S>>,

    /// Applied at the root and at every internal node.
    filter: Box<dyn ActionFilter<S>>,

    rng: SearchRng,

    stats: AlphaBetaStats,
}

/// Values shared by every frame of one decision.
#[derive(Clone, Copy)]
struct Frame {
    agent: PlayerId,
    deadline: Option<Instant>,
}

impl Frame {
    fn expired(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }
}

impl<S: GameState> AlphaBetaSearch<S> {
    /// Create a search with the given static evaluator and no filter.
    pub fn new<E: Evaluator<S> + 'static>(config: AlphaBetaConfig, evaluator: E) -> Self {
        let rng = SearchRng::new(config.seed);
        Self {
            config,
            evaluator: Box::new(evaluator),
            filter: Box::new(NoFilter),
            rng,
            stats: AlphaBetaStats::default(),
        }
    }

    /// Set the action filter.
    pub fn with_filter<F: ActionFilter<S> + 'static>(mut self, filter: F) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Enable or disable alpha-beta cutoffs.
    pub fn with_cutoffs(mut self, enabled: bool) -> Self {
        self.config.cutoffs = enabled;
        self
    }

    /// Best action for `agent` at `root`.
    pub fn decide(
        &mut self,
        root: &S,
        agent: PlayerId,
        max_depth: u32,
        max_time: Duration,
    ) -> Result<S::Action> {
        self.search_with_value(root, agent, max_depth, max_time)
            .map(|(action, _)| action)
    }

    /// Best action for `agent` at `root` together with its backed-up value.
    ///
    /// When filtering leaves a single candidate it is returned without
    /// search, valued by a static evaluation of its expected outcome.
    pub fn search_with_value(
        &mut self,
        root: &S,
        agent: PlayerId,
        max_depth: u32,
        max_time: Duration,
    ) -> Result<(S::Action, f64)> {
        if root.is_terminal() {
            return Err(SearchError::InvalidSearchStart("root state is terminal"));
        }
        let legal = root.legal_actions();
        if legal.is_empty() {
            return Err(SearchError::InvalidSearchStart("root state has no legal actions"));
        }

        let start = Instant::now();
        self.stats.reset();
        let frame = Frame {
            agent,
            deadline: start.checked_add(max_time),
        };

        let actions = self.candidates(root, legal)?;
        let (action, value) = if actions.len() == 1 {
            let value = self.expected_value(root, &actions[0], 0, f64::NEG_INFINITY, f64::INFINITY, frame)?;
            (actions[0].clone(), value)
        } else {
            let depth = max_depth.max(1);
            let (best, value) = self.best_of(root, &actions, depth, f64::NEG_INFINITY, f64::INFINITY, frame)?;
            (actions[best].clone(), value)
        };

        self.stats.time_us = start.elapsed().as_micros() as u64;
        debug!(
            %agent,
            candidates = actions.len(),
            value,
            nodes = self.stats.nodes,
            cutoffs = self.stats.cutoffs,
            deadline_hits = self.stats.deadline_hits,
            time_us = self.stats.time_us,
            "alpha-beta search finished"
        );
        Ok((action, value))
    }

    #[must_use]
    pub fn stats(&self) -> &AlphaBetaStats {
        &self.stats
    }

    #[must_use]
    pub fn config(&self) -> &AlphaBetaConfig {
        &self.config
    }

    fn alphabeta(&mut self, state: &S, depth: u32, alpha: f64, beta: f64, frame: Frame) -> Result<f64> {
        self.stats.nodes += 1;

        let expired = frame.expired();
        if depth == 0 || state.is_terminal() || expired {
            if expired && depth > 0 && !state.is_terminal() {
                self.stats.deadline_hits += 1;
            }
            return Ok(self.evaluate(state, frame.agent));
        }

        let legal = state.legal_actions();
        if legal.is_empty() {
            return Ok(self.evaluate(state, frame.agent));
        }
        let actions = self.candidates(state, legal)?;

        let (_, value) = self.best_of(state, &actions, depth, alpha, beta, frame)?;
        Ok(value)
    }

    /// Filtered `legal` actions; all of `legal` if the filter keeps none.
    fn candidates(&mut self, state: &S, legal: Vec<S::Action>) -> Result<Vec<S::Action>> {
        let kept = self.filter.filter(state, legal.clone(), &mut self.rng)?;
        if kept.is_empty() {
            warn!(actions = legal.len(), "filter kept no actions; searching all of them");
            return Ok(legal);
        }
        Ok(kept)
    }

    /// Index and value of the best action for the mover at `state`.
    ///
    /// Maximizes when the agent moves, minimizes otherwise. The first
    /// action starts as the best and only a strict improvement replaces it.
    fn best_of(
        &mut self,
        state: &S,
        actions: &[S::Action],
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        frame: Frame,
    ) -> Result<(usize, f64)> {
        let maximizing = state.current_player() == frame.agent;
        let mut best = 0;
        let mut best_value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for (i, action) in actions.iter().enumerate() {
            let value = self.expected_value(state, action, depth - 1, alpha, beta, frame)?;

            if maximizing {
                if value > best_value {
                    best = i;
                    best_value = value;
                }
                alpha = alpha.max(best_value);
            } else {
                if value < best_value {
                    best = i;
                    best_value = value;
                }
                beta = beta.min(best_value);
            }

            if self.config.cutoffs && alpha >= beta {
                trace!(depth, explored = i + 1, of = actions.len(), "cutoff");
                self.stats.cutoffs += 1;
                break;
            }
        }

        Ok((best, best_value))
    }

    /// Probability-weighted value of `action`'s outcomes, searched to `depth`.
    fn expected_value(
        &mut self,
        state: &S,
        action: &S::Action,
        depth: u32,
        alpha: f64,
        beta: f64,
        frame: Frame,
    ) -> Result<f64> {
        let mut total = 0.0;
        for outcome in outcomes(state, action)? {
            let value = self.alphabeta(&outcome.state, depth, alpha, beta, frame)?;
            total += outcome.probability * value;
        }
        // Mixing f64::MAX terminal values can overflow to infinity.
        Ok(total.clamp(f64::MIN, f64::MAX))
    }

    fn evaluate(&mut self, state: &S, agent: PlayerId) -> f64 {
        self.stats.leaf_evaluations += 1;
        self.evaluator.evaluate(state, agent)
    }
}

impl<S: BoardView + 'static> AlphaBetaSearch<S> {
    /// Search for board games: the configured value function, plus the
    /// pruning pipeline when `config.pruning` is set.
    pub fn for_board(config: AlphaBetaConfig) -> Result<Self> {
        let value_fn = config.value_fn.build()?;
        let pruning = config.pruning;
        let search = Self::new(config, value_fn);
        Ok(if pruning {
            search.with_filter(FilterPipeline::<S>::pruning())
        } else {
            search
        })
    }
}

/// One-shot Alpha-Beta decision for a board game.
pub fn decide<S: BoardView + 'static>(
    root: &S,
    agent: PlayerId,
    max_depth: u32,
    max_seconds: f64,
    value_fn: &ValueFnConfig,
    pruning: bool,
) -> Result<S::Action> {
    let max_time = Duration::try_from_secs_f64(max_seconds.max(0.0))
        .map_err(|e| SearchError::InvalidConfig(format!("max_seconds: {e}")))?;
    let config = AlphaBetaConfig::default()
        .with_depth(max_depth)
        .with_max_time(max_time)
        .with_pruning(pruning)
        .with_value_fn(value_fn.clone());

    AlphaBetaSearch::for_board(config)?.decide(root, agent, max_depth, max_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{FnEvaluator, LOSS_VALUE, WIN_VALUE};
    use crate::games::tree::{scripted_evaluator, Branch, ScriptedGame, TreeAction, TreeBuilder};

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);
    const LONG: Duration = Duration::from_secs(60);

    fn engine() -> AlphaBetaSearch<ScriptedGame> {
        AlphaBetaSearch::new(AlphaBetaConfig::default(), scripted_evaluator())
    }

    #[test]
    fn test_depth_one_expected_value() {
        // Action 0 is a 50/50 chance between 10 and 0; action 1 a sure 4.
        let mut b = TreeBuilder::new();
        let high = b.leaf(10.0, None);
        let low = b.leaf(0.0, None);
        let sure = b.leaf(4.0, None);
        let root = b.decision(
            P0,
            0.0,
            vec![Branch::chance(vec![(high, 0.5), (low, 0.5)]), Branch::to(sure)],
        );
        let game = b.build(root);

        let (action, value) = engine().search_with_value(&game, P0, 1, LONG).unwrap();
        assert_eq!(action, TreeAction(0));
        assert_eq!(value, 5.0);
    }

    #[test]
    fn test_minimizes_for_opponent() {
        let game = ScriptedGame::uniform(2, 2, |i| [3.0, 5.0, 2.0, 9.0][i]);
        // P1 picks the smaller leaf under each move: 3 and 2.
        let (action, value) = engine().search_with_value(&game, P0, 2, LONG).unwrap();
        assert_eq!(action, TreeAction(0));
        assert_eq!(value, 3.0);
    }

    #[test]
    fn test_cutoffs_match_plain_expectimax() {
        let leaves = |i: usize| ((i * 37 + 11) % 23) as f64 - 11.0;
        let game = ScriptedGame::uniform(3, 3, leaves).with_static_scores(|_| 0.5);

        let mut pruned = engine();
        let mut plain = engine().with_cutoffs(false);

        let with_cutoffs = pruned.search_with_value(&game, P0, 3, LONG).unwrap();
        let without = plain.search_with_value(&game, P0, 3, LONG).unwrap();

        assert_eq!(with_cutoffs, without);
        assert!(pruned.stats().cutoffs > 0);
        assert_eq!(plain.stats().cutoffs, 0);
        assert!(pruned.stats().leaf_evaluations < plain.stats().leaf_evaluations);
    }

    #[test]
    fn test_deadline_falls_back_to_static_values() {
        // Static scores favour action 1; the deep leaves favour action 0.
        let game = ScriptedGame::uniform(3, 2, |i| if i < 4 { 100.0 } else { -100.0 })
            .with_static_scores(|path| if path == [1] { 7.0 } else { 1.0 });

        let mut search = engine();
        let (action, value) = search.search_with_value(&game, P0, 3, Duration::ZERO).unwrap();
        assert_eq!(action, TreeAction(1));
        assert_eq!(value, 7.0);
        assert!(search.stats().timed_out());

        let (deep, _) = engine().search_with_value(&game, P0, 3, LONG).unwrap();
        assert_eq!(deep, TreeAction(0));
    }

    #[test]
    fn test_zero_depth_still_expands_root() {
        let game = ScriptedGame::uniform(1, 3, |i| i as f64);
        let (action, value) = engine().search_with_value(&game, P0, 0, LONG).unwrap();
        assert_eq!(action, TreeAction(2));
        assert_eq!(value, 2.0);
    }

    #[test]
    fn test_ties_keep_first_action() {
        let game = ScriptedGame::uniform(1, 3, |_| 1.0);
        assert_eq!(engine().decide(&game, P0, 1, LONG).unwrap(), TreeAction(0));
    }

    #[test]
    fn test_single_action_fast_path() {
        let game = ScriptedGame::uniform(3, 1, |_| 1.0);
        let mut search = engine();
        assert_eq!(search.decide(&game, P0, 3, LONG).unwrap(), TreeAction(0));
        assert_eq!(search.stats().cutoffs, 0);
    }

    /// Filter that drops every candidate.
    struct DropAll;

    impl ActionFilter<ScriptedGame> for DropAll {
        fn filter(
            &self,
            _state: &ScriptedGame,
            _actions: Vec<TreeAction>,
            _rng: &mut SearchRng,
        ) -> Result<Vec<TreeAction>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_empty_filter_searches_all_actions() {
        let game = ScriptedGame::uniform(2, 3, |i| ((i * 5) % 7) as f64);

        let mut filtered = engine().with_filter(DropAll);
        let got = filtered.search_with_value(&game, P0, 2, LONG).unwrap();
        let want = engine().search_with_value(&game, P0, 2, LONG).unwrap();
        assert_eq!(got, want);
        assert!(got.1.abs() < 10.0);
    }

    #[test]
    fn test_terminal_root_rejected() {
        let game = ScriptedGame::uniform(1, 2, |_| 0.0).apply(&TreeAction(0));
        assert!(matches!(
            engine().decide(&game, P0, 2, LONG),
            Err(SearchError::InvalidSearchStart(_))
        ));
    }

    #[test]
    fn test_terminal_values_dominate() {
        // A huge heuristic score never beats a certain win.
        let mut b = TreeBuilder::new();
        let rich = b.leaf(1e300, None);
        let rich_state = b.decision(P1, 1e300, vec![Branch::to(rich)]);
        let won = b.leaf(0.0, Some(P0));
        let root = b.decision(P0, 0.0, vec![Branch::to(rich_state), Branch::to(won)]);
        let game = b.build(root);

        let (action, value) = engine().search_with_value(&game, P0, 1, LONG).unwrap();
        assert_eq!(action, TreeAction(1));
        assert_eq!(value, WIN_VALUE);
    }

    #[test]
    fn test_certain_loss_is_minimum() {
        let mut b = TreeBuilder::new();
        let lost = b.leaf(0.0, Some(P1));
        let poor = b.leaf(-1e300, None);
        let root = b.decision(P0, 0.0, vec![Branch::to(lost), Branch::to(poor)]);
        let game = b.build(root);

        let (action, _) = engine().search_with_value(&game, P0, 1, LONG).unwrap();
        assert_eq!(action, TreeAction(1));

        let mut only_loss = TreeBuilder::new();
        let lost = only_loss.leaf(0.0, Some(P1));
        let other = only_loss.leaf(0.0, Some(P1));
        let root = only_loss.decision(P0, 0.0, vec![Branch::to(lost), Branch::to(other)]);
        let (_, value) = engine()
            .search_with_value(&only_loss.build(root), P0, 1, LONG)
            .unwrap();
        assert_eq!(value, LOSS_VALUE);
    }

    #[test]
    fn test_expected_value_clamped() {
        let mut b = TreeBuilder::new();
        let win_a = b.leaf(0.0, Some(P0));
        let win_b = b.leaf(0.0, Some(P0));
        let root = b.decision(
            P0,
            0.0,
            vec![
                Branch::chance(vec![(win_a, 0.5), (win_b, 0.5)]),
                Branch::to(win_b),
            ],
        );
        let game = b.build(root);

        let (_, value) = engine().search_with_value(&game, P0, 1, LONG).unwrap();
        assert!(value.is_finite());
        assert_eq!(value, WIN_VALUE);
    }

    #[test]
    fn test_custom_evaluator() {
        let game = ScriptedGame::uniform(1, 3, |i| i as f64);
        // Prefers low scores.
        let evaluator = FnEvaluator(|s: &ScriptedGame, _: PlayerId| -s.score());
        let mut search = AlphaBetaSearch::new(AlphaBetaConfig::default(), evaluator);
        assert_eq!(search.decide(&game, P0, 1, LONG).unwrap(), TreeAction(0));
    }
}

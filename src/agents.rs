//! Agents and a game driver.
//!
//! An `Agent` answers "which action now?" for whatever player is to move.
//! `play_game` seats one agent per player and runs a game to the end,
//! which is how the engines are pitted against each other.

use tracing::{debug, trace};

use crate::alphabeta::AlphaBetaSearch;
use crate::core::{PlayerId, Result, SearchError, SearchRng};
use crate::game::{BoardView, GameState};
use crate::mcts::MctsSearch;
use crate::policy::{PolicyKind, RolloutPolicy};

/// A decision maker for one seat.
pub trait Agent<S: GameState> {
    fn name(&self) -> &str;

    /// Pick an action for the player to move in `state`.
    fn decide(&mut self, state: &S) -> Result<S::Action>;
}

fn legal_or_err<S: GameState>(state: &S) -> Result<Vec<S::Action>> {
    if state.is_terminal() {
        return Err(SearchError::InvalidSearchStart("state is terminal"));
    }
    let legal = state.legal_actions();
    if legal.is_empty() {
        return Err(SearchError::InvalidSearchStart("state has no legal actions"));
    }
    Ok(legal)
}

/// Uniformly random legal actions.
#[derive(Clone, Debug)]
pub struct RandomAgent {
    rng: SearchRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SearchRng::new(seed),
        }
    }
}

impl<S: GameState> Agent<S> for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn decide(&mut self, state: &S) -> Result<S::Action> {
        let legal = legal_or_err(state)?;
        let idx = self.rng.gen_range_usize(0..legal.len());
        Ok(legal[idx].clone())
    }
}

/// Plays whatever a rollout policy picks, without searching.
pub struct PolicyAgent<S: GameState> {
    policy: Box<dyn RolloutPolicy<S>>,
    rng: SearchRng,
}

impl<S: GameState> PolicyAgent<S> {
    pub fn new<P: RolloutPolicy<S> + 'static>(policy: P, seed: u64) -> Self {
        Self {
            policy: Box::new(policy),
            rng: SearchRng::new(seed),
        }
    }
}

impl<S: BoardView> PolicyAgent<S> {
    /// Agent for a configured policy: weighted random, or greedy on a value
    /// function.
    pub fn for_board(kind: &PolicyKind, seed: u64) -> Result<Self> {
        Ok(Self {
            policy: kind.build()?,
            rng: SearchRng::new(seed),
        })
    }
}

impl<S: GameState> Agent<S> for PolicyAgent<S> {
    fn name(&self) -> &str {
        self.policy.name()
    }

    fn decide(&mut self, state: &S) -> Result<S::Action> {
        let legal = legal_or_err(state)?;
        self.policy.choose(state, &legal, &mut self.rng)
    }
}

/// MCTS with a fixed playout budget per decision.
pub struct MctsAgent<S: GameState> {
    search: MctsSearch<S>,
    n_simulations: u32,
}

impl<S: GameState> MctsAgent<S> {
    pub fn new(search: MctsSearch<S>, n_simulations: u32) -> Self {
        Self {
            search,
            n_simulations,
        }
    }

    /// The underlying search, with the tree of the last decision.
    #[must_use]
    pub fn search(&self) -> &MctsSearch<S> {
        &self.search
    }
}

impl<S: GameState> Agent<S> for MctsAgent<S> {
    fn name(&self) -> &str {
        "mcts"
    }

    fn decide(&mut self, state: &S) -> Result<S::Action> {
        let c = self.search.config().exploration_constant;
        self.search
            .decide(state, state.current_player(), self.n_simulations, c)
    }
}

/// Alpha-Beta with the depth and time budget from its config.
pub struct AlphaBetaAgent<S: GameState> {
    search: AlphaBetaSearch<S>,
}

impl<S: GameState> AlphaBetaAgent<S> {
    pub fn new(search: AlphaBetaSearch<S>) -> Self {
        Self { search }
    }

    #[must_use]
    pub fn search(&self) -> &AlphaBetaSearch<S> {
        &self.search
    }
}

impl<S: GameState> Agent<S> for AlphaBetaAgent<S> {
    fn name(&self) -> &str {
        "alphabeta"
    }

    fn decide(&mut self, state: &S) -> Result<S::Action> {
        let depth = self.search.config().max_depth;
        let max_time = self.search.config().max_time;
        self.search
            .decide(state, state.current_player(), depth, max_time)
    }
}

/// Summary of a finished (or abandoned) game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameRecord<A> {
    /// `None` for a draw or a game stopped at `max_decisions`.
    pub winner: Option<PlayerId>,

    /// Number of times the player to move changed.
    pub turns: usize,

    pub decisions: usize,

    /// Whether the game reached a terminal state.
    pub finished: bool,

    /// Every action taken, with the player who took it.
    pub history: Vec<(PlayerId, A)>,
}

/// Play `state` to the end with `agents[p]` deciding for player `p`.
///
/// Stops after `max_decisions` decisions if the game has not ended by
/// then. Fails when a seat has no agent or an agent fails.
pub fn play_game<S: GameState>(
    mut state: S,
    agents: &mut [Box<dyn Agent<S>>],
    max_decisions: usize,
) -> Result<GameRecord<S::Action>> {
    let mut record = GameRecord {
        winner: None,
        turns: 0,
        decisions: 0,
        finished: false,
        history: Vec::new(),
    };

    while !state.is_terminal() && record.decisions < max_decisions {
        let player = state.current_player();
        let seats = agents.len();
        let agent = agents.get_mut(player.index()).ok_or_else(|| {
            SearchError::InvalidConfig(format!("no agent for {player} ({seats} seated)"))
        })?;

        let action = agent.decide(&state)?;
        trace!(%player, agent = agent.name(), decision = record.decisions, "decided");

        state = state.apply(&action);
        record.history.push((player, action));
        record.decisions += 1;
        if state.current_player() != player {
            record.turns += 1;
        }
    }

    record.finished = state.is_terminal();
    record.winner = state.winner();
    debug!(
        winner = ?record.winner,
        decisions = record.decisions,
        finished = record.finished,
        "game over"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabeta::AlphaBetaConfig;
    use crate::games::settlers::{SettlersBuilder, SettlersState};
    use crate::games::tree::{scripted_evaluator, Branch, ScriptedGame, TreeAction, TreeBuilder};
    use crate::mcts::MctsConfig;
    use crate::policy::RandomPolicy;

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);

    /// P0 picks a branch, then P1 answers; only branch 2 wins for P0.
    fn trap() -> ScriptedGame {
        let mut b = TreeBuilder::new();
        let mut branches = Vec::new();
        for i in 0..3 {
            let win = b.leaf(1.0, Some(P0));
            let lose = b.leaf(-1.0, Some(P1));
            let reply = if i == 2 {
                b.decision(P1, 0.0, vec![Branch::to(win)])
            } else {
                b.decision(P1, 0.0, vec![Branch::to(win), Branch::to(lose)])
            };
            branches.push(Branch::to(reply));
        }
        let root = b.decision(P0, 0.0, branches);
        b.build(root)
    }

    #[test]
    fn test_random_agent_picks_legal() {
        let game = ScriptedGame::uniform(2, 4, |_| 0.0);
        let mut agent = RandomAgent::new(3);
        for _ in 0..20 {
            let action = Agent::<ScriptedGame>::decide(&mut agent, &game).unwrap();
            assert!(game.legal_actions().contains(&action));
        }
    }

    #[test]
    fn test_agents_reject_terminal_state() {
        let mut b = TreeBuilder::new();
        let leaf = b.leaf(0.0, None);
        let game = b.build(leaf);

        let mut random = RandomAgent::new(1);
        assert!(matches!(
            Agent::<ScriptedGame>::decide(&mut random, &game),
            Err(SearchError::InvalidSearchStart(_))
        ));
        let mut policy = PolicyAgent::new(RandomPolicy, 1);
        assert!(policy.decide(&game).is_err());
    }

    #[test]
    fn test_search_agents_avoid_the_trap() {
        let game = trap();

        let mut mcts = MctsAgent::new(MctsSearch::new(MctsConfig::default().with_seed(5)), 300);
        assert_eq!(mcts.decide(&game).unwrap(), TreeAction(2));

        let mut ab = AlphaBetaAgent::new(AlphaBetaSearch::new(
            AlphaBetaConfig::default().with_depth(2),
            scripted_evaluator(),
        ));
        assert_eq!(ab.decide(&game).unwrap(), TreeAction(2));
        assert!(ab.search().stats().nodes > 0);
    }

    #[test]
    fn test_play_game_records_history() {
        let game = trap();
        let mut agents: Vec<Box<dyn Agent<ScriptedGame>>> = vec![
            Box::new(AlphaBetaAgent::new(AlphaBetaSearch::new(
                AlphaBetaConfig::default(),
                scripted_evaluator(),
            ))),
            Box::new(RandomAgent::new(0)),
        ];

        let record = play_game(game, &mut agents, 10).unwrap();
        assert!(record.finished);
        assert_eq!(record.winner, Some(P0));
        assert_eq!(record.decisions, 2);
        assert_eq!(record.turns, 2);
        assert_eq!(record.history[0], (P0, TreeAction(2)));
    }

    #[test]
    fn test_play_game_needs_an_agent_per_seat() {
        let game = trap();
        let mut agents: Vec<Box<dyn Agent<ScriptedGame>>> = vec![Box::new(RandomAgent::new(0))];
        let result = play_game(game, &mut agents, 10);
        assert!(matches!(result, Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn test_play_game_stops_at_budget() {
        let game = SettlersBuilder::new().build(2);
        let mut agents: Vec<Box<dyn Agent<SettlersState>>> =
            vec![Box::new(RandomAgent::new(1)), Box::new(RandomAgent::new(2))];
        let record = play_game(game, &mut agents, 3).unwrap();
        assert_eq!(record.decisions, 3);
        assert!(!record.finished);
        assert_eq!(record.winner, None);
    }

    #[test]
    fn test_settlers_random_game_finishes() {
        let game = SettlersBuilder::new().max_turns(40).build(8);
        let mut agents: Vec<Box<dyn Agent<SettlersState>>> = vec![
            Box::new(PolicyAgent::<SettlersState>::for_board(&PolicyKind::default(), 1).unwrap()),
            Box::new(RandomAgent::new(2)),
        ];
        let record = play_game(game, &mut agents, 100_000).unwrap();
        assert!(record.finished);
        assert!(record.turns >= 4);
    }
}

//! Alpha-Beta integration tests on scripted trees and the settlers game.

use std::time::Duration;

use catan_search::alphabeta::{self, AlphaBetaConfig, AlphaBetaSearch};
use catan_search::core::{PlayerId, SearchError};
use catan_search::eval::{Evaluator, ValueFnConfig, LOSS_VALUE, WIN_VALUE};
use catan_search::game::GameState;
use catan_search::games::settlers::{Phase, SettlersBuilder, SettlersState};
use catan_search::games::tree::{scripted_evaluator, Branch, ScriptedGame, TreeAction, TreeBuilder};

const P0: PlayerId = PlayerId(0);
const P1: PlayerId = PlayerId(1);
const LONG: Duration = Duration::from_secs(60);

fn engine() -> AlphaBetaSearch<ScriptedGame> {
    AlphaBetaSearch::new(AlphaBetaConfig::default(), scripted_evaluator())
}

/// Settlers opening where P1 is about to place the settlement that wins a
/// two-point game.
fn one_placement_from_win() -> SettlersState {
    let mut state = SettlersBuilder::new().target_points(2).build(13);
    while !matches!(state.phase(), Phase::Setup { placement: 2 }) {
        let action = state.legal_actions()[0];
        state = state.apply(&action);
    }
    state
}

// =============================================================================
// Expectimax values
// =============================================================================

#[test]
fn test_chance_node_expected_value() {
    // One move is a 50/50 gamble between 10 and 0, the other a sure 4.
    let mut b = TreeBuilder::new();
    let sure = b.leaf(4.0, None);
    let high = b.leaf(10.0, None);
    let low = b.leaf(0.0, None);
    let root = b.decision(
        P0,
        0.0,
        vec![Branch::to(sure), Branch::chance(vec![(high, 0.5), (low, 0.5)])],
    );
    let game = b.build(root);

    let (action, value) = engine().search_with_value(&game, P0, 1, LONG).unwrap();
    assert_eq!(action, TreeAction(1));
    assert_eq!(value, 5.0);
}

#[test]
fn test_single_chance_action_takes_expected_value() {
    let mut b = TreeBuilder::new();
    let high = b.leaf(8.0, None);
    let low = b.leaf(2.0, None);
    let root = b.decision(P0, 0.0, vec![Branch::chance(vec![(high, 0.5), (low, 0.5)])]);
    let game = b.build(root);

    let (action, value) = engine().search_with_value(&game, P0, 1, LONG).unwrap();
    assert_eq!(action, TreeAction(0));
    assert_eq!(value, 0.5 * 8.0 + 0.5 * 2.0);
}

#[test]
fn test_cutoffs_are_lossless() {
    let leaf_sets: [fn(usize) -> f64; 3] = [
        |i| ((i * 7 + 3) % 11) as f64,
        |i| (26 - i) as f64,
        |i| if i % 4 == 0 { 5.0 } else { -(i as f64) },
    ];

    for leaves in leaf_sets {
        let game = ScriptedGame::uniform(3, 3, leaves);
        for agent in [P0, P1] {
            let mut pruned = engine();
            let mut plain = engine().with_cutoffs(false);

            let a = pruned.search_with_value(&game, agent, 3, LONG).unwrap();
            let b = plain.search_with_value(&game, agent, 3, LONG).unwrap();
            assert_eq!(a, b);
            assert!(pruned.stats().nodes <= plain.stats().nodes);
        }
    }
}

#[test]
fn test_deadline_returns_static_estimate() {
    let game = ScriptedGame::uniform(4, 2, |i| i as f64).with_static_scores(|path| {
        path.first().map_or(0.0, |&first| if first == 0 { 3.0 } else { 1.0 })
    });

    let mut search = engine();
    let (action, value) = search.search_with_value(&game, P0, 4, Duration::ZERO).unwrap();
    assert_eq!(action, TreeAction(0));
    assert_eq!(value, 3.0);
    assert!(search.stats().deadline_hits > 0);
}

#[test]
fn test_terminal_root_is_rejected() {
    let mut b = TreeBuilder::new();
    let leaf = b.leaf(1.0, Some(P0));
    let game = b.build(leaf);

    assert!(matches!(
        engine().decide(&game, P0, 2, LONG),
        Err(SearchError::InvalidSearchStart(_))
    ));
}

#[test]
fn test_malformed_expansion_is_reported() {
    let cases: [fn(usize, usize) -> Branch; 2] = [
        |a, b| Branch::chance(vec![(a, 0.6), (b, 0.5)]),
        |_, _| Branch::chance(Vec::new()),
    ];

    for make in cases {
        let mut b = TreeBuilder::new();
        let x = b.leaf(1.0, None);
        let y = b.leaf(0.0, None);
        let root = b.decision(P0, 0.0, vec![Branch::to(x), make(x, y)]);
        let game = b.build(root);

        for depth in [1, 2] {
            assert!(matches!(
                engine().decide(&game, P0, depth, LONG),
                Err(SearchError::MalformedStochasticExpansion { .. })
            ));
        }
    }
}

// =============================================================================
// Settlers
// =============================================================================

#[test]
fn test_value_function_terminal_dominance() {
    let mut state = SettlersBuilder::new().target_points(2).build(13);
    while !state.is_terminal() {
        let action = state.legal_actions()[0];
        state = state.apply(&action);
    }
    assert_eq!(state.winner(), Some(P1));

    for config in [ValueFnConfig::base(), ValueFnConfig::contender()] {
        let value_fn = config.build().unwrap();
        assert_eq!(value_fn.evaluate(&state, P1), WIN_VALUE);
        assert_eq!(value_fn.evaluate(&state, P0), LOSS_VALUE);
    }
}

#[test]
fn test_settlers_sees_winning_placement() {
    let state = one_placement_from_win();
    assert_eq!(state.current_player(), P1);

    let config = AlphaBetaConfig::default().with_depth(1);
    let mut search = AlphaBetaSearch::<SettlersState>::for_board(config).unwrap();
    let (action, value) = search.search_with_value(&state, P1, 1, LONG).unwrap();
    assert_eq!(value, WIN_VALUE);
    assert!(state.legal_actions().contains(&action));
}

#[test]
fn test_one_shot_decide_with_pruning() {
    let state = SettlersBuilder::new().build(21);
    for pruning in [false, true] {
        let action =
            alphabeta::decide(&state, P0, 1, 5.0, &ValueFnConfig::contender(), pruning).unwrap();
        assert!(state.legal_actions().contains(&action));
    }
}

#[test]
fn test_one_shot_decide_rejects_bad_inputs() {
    let state = SettlersBuilder::new().build(21);

    let bad_weights = ValueFnConfig::base().with_weights(vec![1.0; 3]);
    assert!(matches!(
        alphabeta::decide(&state, P0, 1, 1.0, &bad_weights, false),
        Err(SearchError::InvalidConfig(_))
    ));
    assert!(matches!(
        alphabeta::decide(&state, P0, 1, f64::INFINITY, &ValueFnConfig::base(), false),
        Err(SearchError::InvalidConfig(_))
    ));
}

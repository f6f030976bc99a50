//! Heuristic action filters.
//!
//! A filter narrows or reorders the candidate actions of a state before a
//! search explores them. Filters are pure functions of the state and the
//! candidates, apart from an injected `SearchRng` used for tie-breaking.
//!
//! ## Contract
//!
//! - the result is a subset or reordering of the input
//! - the result is empty only when the input is empty
//!
//! `FilterPipeline` enforces both after every stage, so individual stages
//! can stay simple.
//!
//! ## Usage
//!
//! ```rust
//! use catan_search::games::settlers::{SettlersBuilder, SettlersState};
//! use catan_search::heuristics::{ActionFilter, FilterPipeline};
//! use catan_search::core::SearchRng;
//! use catan_search::game::GameState;
//!
//! let state = SettlersBuilder::new().build(7);
//! let pipeline: FilterPipeline<SettlersState> = FilterPipeline::pruning();
//! let mut rng = SearchRng::new(0);
//!
//! let legal = state.legal_actions();
//! let kept = pipeline.filter(&state, legal.clone(), &mut rng).unwrap();
//! assert!(!kept.is_empty());
//! assert!(kept.iter().all(|a| legal.contains(a)));
//! ```

pub mod stages;

pub use stages::{
    MostImpactfulDisruption, RedundantTrade, RobberTarget, SettlementYield, SingleTilePlacement,
    TradeSkip,
};

use tracing::{trace, warn};

use crate::core::{Result, SearchRng};
use crate::game::{ActionFamily, BoardView, GameState};

/// Narrows candidate actions before they are searched.
pub trait ActionFilter<S: GameState> {
    fn filter(
        &self,
        state: &S,
        actions: Vec<S::Action>,
        rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>>;
}

/// Identity filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFilter;

impl<S: GameState> ActionFilter<S> for NoFilter {
    fn filter(
        &self,
        _state: &S,
        actions: Vec<S::Action>,
        _rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>> {
        Ok(actions)
    }
}

/// One named, independently testable step of a `FilterPipeline`.
pub trait FilterStage<S: GameState> {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        state: &S,
        actions: Vec<S::Action>,
        rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>>;
}

/// Ordered list of filter stages.
pub struct FilterPipeline<S: GameState> {
    stages: Vec<Box<dyn FilterStage<S>>>,
}

impl<S: GameState> Default for FilterPipeline<S> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<S: GameState> FilterPipeline<S> {
    /// An empty pipeline (identity).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    #[must_use]
    pub fn with_stage<F: FilterStage<S> + 'static>(mut self, stage: F) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<S: BoardView> FilterPipeline<S> {
    /// Stages that steer MCTS expansion toward promising moves.
    #[must_use]
    pub fn exploration() -> Self {
        Self::new()
            .with_stage(SettlementYield::default())
            .with_stage(RobberTarget::default())
            .with_stage(TradeSkip::default())
    }

    /// Stages that cut Alpha-Beta branching.
    #[must_use]
    pub fn pruning() -> Self {
        Self::new()
            .with_stage(SingleTilePlacement)
            .with_stage(RedundantTrade)
            .with_stage(MostImpactfulDisruption::new(ActionFamily::MoveRobber))
            .with_stage(MostImpactfulDisruption::new(ActionFamily::PlayKnight))
    }
}

impl<S: GameState> ActionFilter<S> for FilterPipeline<S> {
    fn filter(
        &self,
        state: &S,
        actions: Vec<S::Action>,
        rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>> {
        let mut current = actions;

        for stage in &self.stages {
            if current.is_empty() {
                break;
            }

            let input = current.clone();
            let mut output = stage.apply(state, current, rng)?;

            let produced = output.len();
            output.retain(|a| input.contains(a));
            if output.len() != produced {
                warn!(
                    stage = stage.name(),
                    dropped = produced - output.len(),
                    "filter stage introduced actions; dropped them"
                );
            }

            if output.is_empty() {
                trace!(stage = stage.name(), "filter stage removed every candidate; keeping input");
                output = input;
            }
            current = output;
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;

    #[derive(Clone, Debug)]
    struct Counter(u32);

    impl GameState for Counter {
        type Action = u32;

        fn current_player(&self) -> PlayerId {
            PlayerId::new(0)
        }

        fn legal_actions(&self) -> Vec<u32> {
            (0..self.0).collect()
        }

        fn apply(&self, _action: &u32) -> Self {
            self.clone()
        }

        fn is_terminal(&self) -> bool {
            false
        }

        fn winner(&self) -> Option<PlayerId> {
            None
        }
    }

    struct DropAll;

    impl FilterStage<Counter> for DropAll {
        fn name(&self) -> &'static str {
            "drop_all"
        }

        fn apply(&self, _: &Counter, _: Vec<u32>, _: &mut SearchRng) -> Result<Vec<u32>> {
            Ok(vec![])
        }
    }

    struct Invent;

    impl FilterStage<Counter> for Invent {
        fn name(&self) -> &'static str {
            "invent"
        }

        fn apply(&self, _: &Counter, mut actions: Vec<u32>, _: &mut SearchRng) -> Result<Vec<u32>> {
            actions.push(99);
            actions.reverse();
            Ok(actions)
        }
    }

    struct KeepEven;

    impl FilterStage<Counter> for KeepEven {
        fn name(&self) -> &'static str {
            "keep_even"
        }

        fn apply(&self, _: &Counter, actions: Vec<u32>, _: &mut SearchRng) -> Result<Vec<u32>> {
            Ok(actions.into_iter().filter(|a| a % 2 == 0).collect())
        }
    }

    #[test]
    fn test_no_filter_is_identity() {
        let state = Counter(4);
        let mut rng = SearchRng::new(0);
        let out = NoFilter.filter(&state, state.legal_actions(), &mut rng).unwrap();
        assert_eq!(out, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_pipeline_restores_emptied_input() {
        let state = Counter(3);
        let mut rng = SearchRng::new(0);
        let pipeline = FilterPipeline::new().with_stage(DropAll);
        let out = pipeline.filter(&state, state.legal_actions(), &mut rng).unwrap();
        assert_eq!(out, vec![0, 1, 2]);
    }

    #[test]
    fn test_pipeline_drops_invented_actions() {
        let state = Counter(3);
        let mut rng = SearchRng::new(0);
        let pipeline = FilterPipeline::new().with_stage(Invent);
        let out = pipeline.filter(&state, state.legal_actions(), &mut rng).unwrap();
        assert_eq!(out, vec![2, 1, 0]);
    }

    #[test]
    fn test_pipeline_runs_in_order() {
        let state = Counter(5);
        let mut rng = SearchRng::new(0);
        let pipeline = FilterPipeline::new().with_stage(KeepEven).with_stage(Invent);
        assert_eq!(pipeline.stage_names(), vec!["keep_even", "invent"]);
        let out = pipeline.filter(&state, state.legal_actions(), &mut rng).unwrap();
        assert_eq!(out, vec![4, 2, 0]);
    }

    #[test]
    fn test_pipeline_empty_input() {
        let state = Counter(0);
        let mut rng = SearchRng::new(0);
        let pipeline = FilterPipeline::new().with_stage(DropAll);
        assert!(pipeline.filter(&state, vec![], &mut rng).unwrap().is_empty());
    }
}

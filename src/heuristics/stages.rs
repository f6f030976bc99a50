//! Filter stages for Catan-style games.
//!
//! Each stage only touches the action family it is about and passes every
//! other candidate through untouched.

use tracing::trace;

use super::FilterStage;
use crate::core::{PlayerId, Result, SearchRng};
use crate::eval::value_production;
use crate::game::{outcomes, ActionFamily, BoardView, Resource};

/// Prefer settlement spots that touch many different resources.
///
/// Spots producing at least three resources win (keep `keep_three`),
/// then spots producing at least two (keep `keep_two`). When the mover
/// has no brick (then no wood) income, a spot must also provide it.
/// Candidates are shuffled first so truncation does not always favour
/// low spot indices.
#[derive(Clone, Debug)]
pub struct SettlementYield {
    pub keep_three: usize,
    pub keep_two: usize,
}

impl Default for SettlementYield {
    fn default() -> Self {
        Self {
            keep_three: 3,
            keep_two: 4,
        }
    }
}

impl<S: BoardView> FilterStage<S> for SettlementYield {
    fn name(&self) -> &'static str {
        "settlement_yield"
    }

    fn apply(
        &self,
        state: &S,
        actions: Vec<S::Action>,
        rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>> {
        let (mut spots, others): (Vec<_>, Vec<_>) = actions
            .into_iter()
            .partition(|a| state.action_family(a).is_settlement());
        if spots.is_empty() {
            return Ok(others);
        }

        rng.shuffle(&mut spots);

        let own = state.production(state.current_player());
        let needed = [Resource::Brick, Resource::Wood]
            .into_iter()
            .find(|&r| !own.has(r));

        let pick = |min_variety: usize, keep: usize| -> Vec<S::Action> {
            spots
                .iter()
                .filter(|a| {
                    state.spot_production(a).map_or(false, |p| {
                        p.variety() >= min_variety && needed.map_or(true, |r| p.has(r))
                    })
                })
                .take(keep)
                .cloned()
                .collect()
        };

        let mut kept = pick(3, self.keep_three);
        if kept.is_empty() {
            kept = pick(2, self.keep_two);
        }
        if kept.is_empty() {
            kept = spots;
        }

        kept.extend(others);
        Ok(kept)
    }
}

/// Keep robber moves aimed at the tiles touching the most opponent
/// buildings.
#[derive(Clone, Debug)]
pub struct RobberTarget {
    /// How many distinct target tiles survive.
    pub tiles: usize,
}

impl Default for RobberTarget {
    fn default() -> Self {
        Self { tiles: 2 }
    }
}

impl<S: BoardView> FilterStage<S> for RobberTarget {
    fn name(&self) -> &'static str {
        "robber_target"
    }

    fn apply(
        &self,
        state: &S,
        actions: Vec<S::Action>,
        _rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>> {
        let mover = state.current_player();

        let mut targets: Vec<(usize, usize)> = Vec::new();
        for action in &actions {
            if !state.action_family(action).is_disruptive() {
                continue;
            }
            if let Some(tile) = state.robber_target(action) {
                if !targets.iter().any(|&(t, _)| t == tile) {
                    targets.push((tile, state.opponent_buildings_on_tile(tile, mover)));
                }
            }
        }
        if targets.is_empty() {
            return Ok(actions);
        }

        // Stable: equal counts keep first-seen order.
        targets.sort_by(|a, b| b.1.cmp(&a.1));
        targets.truncate(self.tiles);

        Ok(actions
            .into_iter()
            .filter(|a| {
                !state.action_family(a).is_disruptive()
                    || state
                        .robber_target(a)
                        .map_or(false, |tile| targets.iter().any(|&(t, _)| t == tile))
            })
            .collect())
    }
}

/// With probability `epsilon`, ignore maritime trades entirely.
#[derive(Clone, Debug)]
pub struct TradeSkip {
    pub epsilon: f64,
}

impl Default for TradeSkip {
    fn default() -> Self {
        Self { epsilon: 0.1 }
    }
}

impl<S: BoardView> FilterStage<S> for TradeSkip {
    fn name(&self) -> &'static str {
        "trade_skip"
    }

    fn apply(
        &self,
        state: &S,
        actions: Vec<S::Action>,
        rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>> {
        let has_trade = actions
            .iter()
            .any(|a| state.action_family(a) == ActionFamily::MaritimeTrade);
        if !has_trade || !rng.gen_bool(self.epsilon) {
            return Ok(actions);
        }

        Ok(actions
            .into_iter()
            .filter(|a| state.action_family(a) != ActionFamily::MaritimeTrade)
            .collect())
    }
}

/// Drop opening placements on spots that touch a single tile.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleTilePlacement;

impl<S: BoardView> FilterStage<S> for SingleTilePlacement {
    fn name(&self) -> &'static str {
        "single_tile_placement"
    }

    fn apply(
        &self,
        state: &S,
        actions: Vec<S::Action>,
        _rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>> {
        Ok(actions
            .into_iter()
            .filter(|a| {
                state.action_family(a) != ActionFamily::InitialPlacement
                    || state.spot_tile_count(a) != Some(1)
            })
            .collect())
    }
}

/// Drop trades when a strictly better ratio for the same exchange is
/// also legal.
#[derive(Clone, Copy, Debug, Default)]
pub struct RedundantTrade;

impl<S: BoardView> FilterStage<S> for RedundantTrade {
    fn name(&self) -> &'static str {
        "redundant_trade"
    }

    fn apply(
        &self,
        state: &S,
        actions: Vec<S::Action>,
        _rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>> {
        let offers: Vec<_> = actions.iter().filter_map(|a| state.trade_offer(a)).collect();
        if offers.is_empty() {
            return Ok(actions);
        }

        Ok(actions
            .into_iter()
            .filter(|a| match state.trade_offer(a) {
                Some(offer) => !offers.iter().any(|o| {
                    o.give == offer.give && o.receive == offer.receive && o.ratio < offer.ratio
                }),
                None => true,
            })
            .collect())
    }
}

/// Keep only the single most damaging candidate of one disruptive family.
///
/// Impact is opponents' production minus the mover's own production after
/// the action, averaged over its outcomes. Targets touching opponent
/// buildings are preferred whenever one exists.
#[derive(Clone, Debug)]
pub struct MostImpactfulDisruption {
    family: ActionFamily,
}

impl MostImpactfulDisruption {
    #[must_use]
    pub fn new(family: ActionFamily) -> Self {
        Self { family }
    }

    fn impact<S: BoardView>(state: &S, action: &S::Action, mover: PlayerId) -> Result<f64> {
        let mut expected = 0.0;
        for outcome in outcomes(state, action)? {
            let after = &outcome.state;
            let own = value_production(&after.production(mover), true);
            let enemy: f64 = after
                .opponents(mover)
                .into_iter()
                .map(|p| value_production(&after.production(p), true))
                .sum();
            expected += outcome.probability * (enemy - own);
        }
        Ok(expected)
    }
}

impl<S: BoardView> FilterStage<S> for MostImpactfulDisruption {
    fn name(&self) -> &'static str {
        match self.family {
            ActionFamily::MoveRobber => "most_impactful_robber",
            ActionFamily::PlayKnight => "most_impactful_knight",
            _ => "most_impactful_disruption",
        }
    }

    fn apply(
        &self,
        state: &S,
        actions: Vec<S::Action>,
        _rng: &mut SearchRng,
    ) -> Result<Vec<S::Action>> {
        let mover = state.current_player();
        let candidates: Vec<usize> = actions
            .iter()
            .enumerate()
            .filter(|(_, a)| state.action_family(a) == self.family)
            .map(|(i, _)| i)
            .collect();
        if candidates.len() <= 1 {
            return Ok(actions);
        }

        let hits_opponent = |i: &usize| {
            state
                .robber_target(&actions[*i])
                .map_or(false, |tile| state.opponent_buildings_on_tile(tile, mover) > 0)
        };
        let targeted: Vec<usize> = candidates.iter().copied().filter(hits_opponent).collect();
        let pool = if targeted.is_empty() { candidates } else { targeted };

        let mut best: Option<(usize, f64)> = None;
        for i in pool {
            let impact = Self::impact(state, &actions[i], mover)?;
            if best.map_or(true, |(_, b)| impact > b) {
                best = Some((i, impact));
            }
        }
        let Some((keep, impact)) = best else {
            return Ok(actions);
        };
        trace!(family = ?self.family, index = keep, impact, "kept most impactful disruption");

        let family = self.family;
        Ok(actions
            .into_iter()
            .enumerate()
            .filter(|(i, a)| *i == keep || state.action_family(a) != family)
            .map(|(_, a)| a)
            .collect())
    }
}

//! Read-only board features used by heuristics and value functions.
//!
//! `BoardView` is an optional extension of `GameState` for Catan-style
//! games. The engines themselves never require it; the filter stages in
//! `heuristics`, the `ValueFunction` and the weighted rollout policy do.

use std::ops::{Add, Index, IndexMut, Sub};

use serde::{Deserialize, Serialize};

use super::state::GameState;
use crate::core::PlayerId;

/// Producible resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Per-resource amounts: production probabilities, card counts, ...
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceVector(pub [f64; 5]);

impl ResourceVector {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Number of resources with a non-zero amount.
    #[must_use]
    pub fn variety(&self) -> usize {
        self.0.iter().filter(|&&v| v != 0.0).count()
    }

    #[must_use]
    pub fn has(&self, resource: Resource) -> bool {
        self[resource] > 0.0
    }
}

impl Index<Resource> for ResourceVector {
    type Output = f64;

    fn index(&self, resource: Resource) -> &f64 {
        &self.0[resource.index()]
    }
}

impl IndexMut<Resource> for ResourceVector {
    fn index_mut(&mut self, resource: Resource) -> &mut f64 {
        &mut self.0[resource.index()]
    }
}

impl Add for ResourceVector {
    type Output = ResourceVector;

    fn add(mut self, rhs: ResourceVector) -> ResourceVector {
        for r in Resource::ALL {
            self[r] += rhs[r];
        }
        self
    }
}

impl Sub for ResourceVector {
    type Output = ResourceVector;

    fn sub(mut self, rhs: ResourceVector) -> ResourceVector {
        for r in Resource::ALL {
            self[r] -= rhs[r];
        }
        self
    }
}

/// Coarse classification of actions into decision families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionFamily {
    Roll,
    EndTurn,
    /// Free settlement placed during the opening rounds.
    InitialPlacement,
    BuildSettlement,
    BuildCity,
    BuildRoad,
    BuyDevelopmentCard,
    PlayKnight,
    MoveRobber,
    MaritimeTrade,
    Other,
}

impl ActionFamily {
    /// Families that move the robber onto a tile.
    #[must_use]
    pub fn is_disruptive(self) -> bool {
        matches!(self, ActionFamily::MoveRobber | ActionFamily::PlayKnight)
    }

    /// Families that place a settlement on a spot.
    #[must_use]
    pub fn is_settlement(self) -> bool {
        matches!(
            self,
            ActionFamily::InitialPlacement | ActionFamily::BuildSettlement
        )
    }
}

/// A maritime trade offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeOffer {
    pub give: Resource,
    pub receive: Resource,
    /// Cards given per card received (4, 3 or 2).
    pub ratio: u8,
}

/// Board features for Catan-style games.
pub trait BoardView: GameState {
    /// Seats in turn order.
    fn players(&self) -> Vec<PlayerId>;

    fn action_family(&self, action: &Self::Action) -> ActionFamily;

    fn victory_points(&self, player: PlayerId) -> u32;

    fn longest_road_length(&self, player: PlayerId) -> u32;

    fn development_cards_in_hand(&self, player: PlayerId) -> u32;

    fn development_cards_played(&self, player: PlayerId) -> u32;

    fn knights_played(&self, player: PlayerId) -> u32;

    fn resource_cards_in_hand(&self, player: PlayerId) -> u32;

    /// Spots where `player` could legally build a settlement right now,
    /// ignoring cost.
    fn buildable_spot_count(&self, player: PlayerId) -> usize;

    /// Expected resources per roll from the player's buildings.
    fn production(&self, player: PlayerId) -> ResourceVector;

    /// Production of open spots one road away from the player's network.
    fn reachable_production(&self, player: PlayerId) -> ResourceVector;

    /// Per-resource production of the spot a settlement action targets.
    fn spot_production(&self, action: &Self::Action) -> Option<ResourceVector>;

    /// Number of tiles touching the spot a settlement action targets.
    fn spot_tile_count(&self, action: &Self::Action) -> Option<usize>;

    /// Tile a robber/knight action targets.
    fn robber_target(&self, action: &Self::Action) -> Option<usize>;

    /// Buildings owned by anyone but `player` on `tile`
    /// (a city counts once).
    fn opponent_buildings_on_tile(&self, tile: usize, player: PlayerId) -> usize;

    fn trade_offer(&self, action: &Self::Action) -> Option<TradeOffer>;

    /// Opponents of `player`, in turn order.
    fn opponents(&self, player: PlayerId) -> Vec<PlayerId> {
        self.players().into_iter().filter(|&p| p != player).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_vector_ops() {
        let mut a = ResourceVector::default();
        a[Resource::Wood] = 0.1;
        a[Resource::Ore] = 0.2;

        let mut b = ResourceVector::default();
        b[Resource::Wood] = 0.05;

        assert!((a.total() - 0.3).abs() < 1e-12);
        assert_eq!(a.variety(), 2);
        assert!(a.has(Resource::Ore));
        assert!(!a.has(Resource::Brick));
        assert!(((a - b)[Resource::Wood] - 0.05).abs() < 1e-12);
        assert!(((a + b)[Resource::Wood] - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_family_groups() {
        assert!(ActionFamily::PlayKnight.is_disruptive());
        assert!(ActionFamily::MoveRobber.is_disruptive());
        assert!(!ActionFamily::MaritimeTrade.is_disruptive());
        assert!(ActionFamily::InitialPlacement.is_settlement());
        assert!(!ActionFamily::BuildCity.is_settlement());
    }
}

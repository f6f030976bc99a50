//! Settlers actions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{ActionFamily, TradeOffer};

/// Build costs as `[wood, brick, sheep, wheat, ore]`.
pub const ROAD_COST: [u8; 5] = [1, 1, 0, 0, 0];
pub const SETTLEMENT_COST: [u8; 5] = [1, 1, 1, 1, 0];
pub const CITY_COST: [u8; 5] = [0, 0, 0, 2, 3];
pub const DEVELOPMENT_CARD_COST: [u8; 5] = [0, 0, 1, 1, 1];

/// Chance that a bought development card is a knight; otherwise it is a
/// victory point.
pub const KNIGHT_PROBABILITY: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlersAction {
    /// Free settlement (and adjoining road) during the opening rounds.
    PlaceInitial(usize),
    Roll,
    /// Robber move after a 7, onto the given tile.
    MoveRobber(usize),
    /// Knight card moving the robber onto the given tile.
    PlayKnight(usize),
    BuildSettlement(usize),
    BuildCity(usize),
    BuildRoad(usize),
    BuyDevelopmentCard,
    MaritimeTrade(TradeOffer),
    EndTurn,
}

impl SettlersAction {
    #[must_use]
    pub fn family(&self) -> ActionFamily {
        match self {
            SettlersAction::PlaceInitial(_) => ActionFamily::InitialPlacement,
            SettlersAction::Roll => ActionFamily::Roll,
            SettlersAction::MoveRobber(_) => ActionFamily::MoveRobber,
            SettlersAction::PlayKnight(_) => ActionFamily::PlayKnight,
            SettlersAction::BuildSettlement(_) => ActionFamily::BuildSettlement,
            SettlersAction::BuildCity(_) => ActionFamily::BuildCity,
            SettlersAction::BuildRoad(_) => ActionFamily::BuildRoad,
            SettlersAction::BuyDevelopmentCard => ActionFamily::BuyDevelopmentCard,
            SettlersAction::MaritimeTrade(_) => ActionFamily::MaritimeTrade,
            SettlersAction::EndTurn => ActionFamily::EndTurn,
        }
    }

    /// Spot targeted by a settlement action.
    #[must_use]
    pub fn settlement_spot(&self) -> Option<usize> {
        match *self {
            SettlersAction::PlaceInitial(spot) | SettlersAction::BuildSettlement(spot) => Some(spot),
            _ => None,
        }
    }

    /// Tile targeted by a robber action.
    #[must_use]
    pub fn robber_tile(&self) -> Option<usize> {
        match *self {
            SettlersAction::MoveRobber(tile) | SettlersAction::PlayKnight(tile) => Some(tile),
            _ => None,
        }
    }
}

impl fmt::Display for SettlersAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlersAction::PlaceInitial(s) => write!(f, "place initial settlement at spot {s}"),
            SettlersAction::Roll => write!(f, "roll"),
            SettlersAction::MoveRobber(t) => write!(f, "move robber to tile {t}"),
            SettlersAction::PlayKnight(t) => write!(f, "play knight on tile {t}"),
            SettlersAction::BuildSettlement(s) => write!(f, "build settlement at spot {s}"),
            SettlersAction::BuildCity(s) => write!(f, "build city at spot {s}"),
            SettlersAction::BuildRoad(e) => write!(f, "build road on edge {e}"),
            SettlersAction::BuyDevelopmentCard => write!(f, "buy development card"),
            SettlersAction::MaritimeTrade(o) => {
                write!(f, "trade {} {:?} for 1 {:?}", o.ratio, o.give, o.receive)
            }
            SettlersAction::EndTurn => write!(f, "end turn"),
        }
    }
}

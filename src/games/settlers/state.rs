//! Settlers game state and rules.

use std::sync::Arc;

use im::Vector;

use crate::core::{PlayerId, PlayerMap, SearchRng};
use crate::game::{ActionFamily, BoardView, GameState, Outcome, Resource, ResourceVector, TradeOffer};

use super::action::{
    SettlersAction, CITY_COST, DEVELOPMENT_CARD_COST, KNIGHT_PROBABILITY, ROAD_COST,
    SETTLEMENT_COST,
};
use super::board::{roll_probability, Board, Port};

pub const MAX_SETTLEMENTS: u8 = 5;
pub const MAX_CITIES: u8 = 4;
pub const MAX_ROADS: u8 = 15;

/// Shortest road that earns the longest-road bonus.
pub const LONGEST_ROAD_MIN: u32 = 5;

/// Fewest knights that earn the largest-army bonus.
pub const LARGEST_ARMY_MIN: u32 = 3;

/// Hands above this size lose half their cards on a 7.
pub const HAND_LIMIT: u32 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Building {
    pub owner: PlayerId,
    pub city: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerState {
    /// Resource cards, indexed by `Resource::index`.
    pub hand: [u8; 5],
    pub settlements: u8,
    pub cities: u8,
    pub roads: u8,
    /// Knight cards that can be played.
    pub knights: u8,
    /// Knight cards bought this turn.
    pub fresh_knights: u8,
    pub victory_cards: u8,
    pub knights_played: u8,
}

impl PlayerState {
    #[must_use]
    pub fn cards(&self) -> u32 {
        self.hand.iter().map(|&c| u32::from(c)).sum()
    }

    #[must_use]
    pub fn can_afford(&self, cost: [u8; 5]) -> bool {
        self.hand.iter().zip(cost).all(|(&have, need)| have >= need)
    }

    fn pay(&mut self, cost: [u8; 5]) {
        for (have, need) in self.hand.iter_mut().zip(cost) {
            *have = have.saturating_sub(need);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Opening placements; `placement` counts settlements placed so far.
    Setup { placement: u8 },
    Turn {
        rolled: bool,
        /// A 7 was rolled and the robber has not moved yet.
        robber_pending: bool,
        knight_played: bool,
    },
    Finished,
}

impl Phase {
    const NEW_TURN: Phase = Phase::Turn {
        rolled: false,
        robber_pending: false,
        knight_played: false,
    };
}

/// Builder for the opening state of a game.
#[derive(Clone, Debug)]
pub struct SettlersBuilder {
    players: usize,
    ring_tiles: usize,
    target_points: u32,
    max_turns: u32,
}

impl Default for SettlersBuilder {
    fn default() -> Self {
        Self {
            players: 2,
            ring_tiles: 9,
            target_points: 10,
            max_turns: 200,
        }
    }
}

impl SettlersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players(mut self, count: usize) -> Self {
        assert!((2..=4).contains(&count), "Player count must be 2-4");
        self.players = count;
        self
    }

    pub fn ring_tiles(mut self, count: usize) -> Self {
        assert!(count >= 3, "A ring needs at least 3 tiles");
        self.ring_tiles = count;
        self
    }

    pub fn target_points(mut self, points: u32) -> Self {
        self.target_points = points;
        self
    }

    /// Turns after which the game ends in a draw.
    pub fn max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns;
        self
    }

    /// Shuffle the board with `seed` and return the opening state.
    pub fn build(self, seed: u64) -> SettlersState {
        let mut rng = SearchRng::new(seed);
        let board = Board::ring(self.ring_tiles, &mut rng);
        let robber = board.desert();
        let spots = board.spots().len();
        let edges = board.edges().len();

        SettlersState {
            board: Arc::new(board),
            players: PlayerMap::with_default(self.players),
            buildings: std::iter::repeat(None).take(spots).collect(),
            roads: std::iter::repeat(None).take(edges).collect(),
            robber,
            phase: Phase::Setup { placement: 0 },
            current: PlayerId::new(0),
            turn: 0,
            target_points: self.target_points,
            max_turns: self.max_turns,
            longest_road: None,
            largest_army: None,
            winner: None,
            rng: rng.fork(),
        }
    }
}

/// A position in a Settlers game.
///
/// Cloning shares the board and the persistent building and road vectors,
/// so search copies stay cheap.
#[derive(Clone, Debug)]
pub struct SettlersState {
    board: Arc<Board>,
    players: PlayerMap<PlayerState>,
    buildings: Vector<Option<Building>>,
    roads: Vector<Option<PlayerId>>,
    robber: usize,
    phase: Phase,
    current: PlayerId,
    turn: u32,
    target_points: u32,
    max_turns: u32,
    longest_road: Option<PlayerId>,
    largest_army: Option<PlayerId>,
    winner: Option<PlayerId>,
    /// Resolves chance actions in `apply`.
    rng: SearchRng,
}

impl SettlersState {
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed turns since the opening.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Tile the robber stands on.
    #[must_use]
    pub fn robber(&self) -> usize {
        self.robber
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player]
    }

    #[must_use]
    pub fn building(&self, spot: usize) -> Option<Building> {
        self.buildings.get(spot).copied().flatten()
    }

    #[must_use]
    pub fn road(&self, edge: usize) -> Option<PlayerId> {
        self.roads.get(edge).copied().flatten()
    }

    #[must_use]
    pub fn longest_road_holder(&self) -> Option<PlayerId> {
        self.longest_road
    }

    #[must_use]
    pub fn largest_army_holder(&self) -> Option<PlayerId> {
        self.largest_army
    }

    /// Replace a player's resource cards. Handy for setting up positions.
    #[must_use]
    pub fn with_hand(mut self, player: PlayerId, hand: [u8; 5]) -> Self {
        self.players[player].hand = hand;
        self
    }

    /// Give a player playable knight cards.
    #[must_use]
    pub fn with_knights(mut self, player: PlayerId, knights: u8) -> Self {
        self.players[player].knights = knights;
        self
    }

    fn player_count(&self) -> usize {
        self.players.player_count()
    }

    fn setup_player(&self, placement: u8) -> PlayerId {
        let n = self.player_count();
        let k = usize::from(placement);
        let seat = if k < n { k } else { 2 * n - 1 - k };
        PlayerId::new(seat as u8)
    }

    // === Topology queries ===

    /// Empty and no building on a neighbouring spot.
    fn spot_open(&self, spot: usize) -> bool {
        self.building(spot).is_none()
            && self
                .board
                .spot(spot)
                .neighbors
                .iter()
                .all(|&n| self.building(n).is_none())
    }

    fn touches_own_road(&self, player: PlayerId, spot: usize) -> bool {
        self.board
            .spot(spot)
            .edges
            .iter()
            .any(|&e| self.road(e) == Some(player))
    }

    fn can_settle(&self, player: PlayerId, spot: usize) -> bool {
        self.spot_open(spot) && self.touches_own_road(player, spot)
    }

    /// `player`'s network reaches `spot` and no opponent building blocks it.
    fn network_node(&self, player: PlayerId, spot: usize) -> bool {
        match self.building(spot) {
            Some(b) => b.owner == player,
            None => self.touches_own_road(player, spot),
        }
    }

    fn can_build_road(&self, player: PlayerId, edge: usize) -> bool {
        let (a, b) = self.board.edges()[edge];
        self.road(edge).is_none() && (self.network_node(player, a) || self.network_node(player, b))
    }

    /// Longest trail of `player`'s roads not passing through an opponent's
    /// building.
    fn road_length(&self, player: PlayerId) -> u32 {
        let mut used = vec![false; self.roads.len()];
        let mut best = 0;

        for edge in 0..self.roads.len() {
            if self.road(edge) != Some(player) {
                continue;
            }
            let (a, b) = self.board.edges()[edge];
            used[edge] = true;
            best = best.max(1 + self.extend_road(player, a, &mut used));
            best = best.max(1 + self.extend_road(player, b, &mut used));
            used[edge] = false;
        }
        best
    }

    fn extend_road(&self, player: PlayerId, spot: usize, used: &mut [bool]) -> u32 {
        if self.building(spot).map_or(false, |b| b.owner != player) {
            return 0;
        }
        let mut best = 0;
        for &edge in &self.board.spot(spot).edges {
            if used[edge] || self.road(edge) != Some(player) {
                continue;
            }
            used[edge] = true;
            let next = self.board.other_end(edge, spot);
            best = best.max(1 + self.extend_road(player, next, used));
            used[edge] = false;
        }
        best
    }

    fn trade_ratio(&self, player: PlayerId, give: Resource) -> u8 {
        let mut ratio = 4;
        for (spot, building) in self.buildings.iter().enumerate() {
            if !matches!(building, Some(b) if b.owner == player) {
                continue;
            }
            match self.board.spot(spot).port {
                Some(Port::Special(r)) if r == give => ratio = ratio.min(2),
                Some(Port::Generic) => ratio = ratio.min(3),
                _ => {}
            }
        }
        ratio
    }

    fn trade_offers(&self, player: PlayerId) -> Vec<TradeOffer> {
        let hand = self.players[player].hand;
        let mut offers = Vec::new();

        for give in Resource::ALL {
            let best = self.trade_ratio(player, give);
            for ratio in [4u8, 3, 2] {
                if ratio < best || hand[give.index()] < ratio {
                    continue;
                }
                for receive in Resource::ALL {
                    if receive != give {
                        offers.push(TradeOffer { give, receive, ratio });
                    }
                }
            }
        }
        offers
    }

    fn robber_moves(&self, make: fn(usize) -> SettlersAction) -> Vec<SettlersAction> {
        (0..self.board.tiles().len())
            .filter(|&t| t != self.robber)
            .map(make)
            .collect()
    }

    fn main_actions(&self, player: PlayerId, knight_played: bool) -> Vec<SettlersAction> {
        let me = &self.players[player];
        let mut actions = Vec::new();

        if me.settlements < MAX_SETTLEMENTS && me.can_afford(SETTLEMENT_COST) {
            actions.extend(
                (0..self.buildings.len())
                    .filter(|&s| self.can_settle(player, s))
                    .map(SettlersAction::BuildSettlement),
            );
        }
        if me.cities < MAX_CITIES && me.can_afford(CITY_COST) {
            actions.extend(
                (0..self.buildings.len())
                    .filter(|&s| self.building(s) == Some(Building { owner: player, city: false }))
                    .map(SettlersAction::BuildCity),
            );
        }
        if me.roads < MAX_ROADS && me.can_afford(ROAD_COST) {
            actions.extend(
                (0..self.roads.len())
                    .filter(|&e| self.can_build_road(player, e))
                    .map(SettlersAction::BuildRoad),
            );
        }
        if me.can_afford(DEVELOPMENT_CARD_COST) {
            actions.push(SettlersAction::BuyDevelopmentCard);
        }
        if me.knights > 0 && !knight_played {
            actions.extend(self.robber_moves(SettlersAction::PlayKnight));
        }
        actions.extend(
            self.trade_offers(player)
                .into_iter()
                .map(SettlersAction::MaritimeTrade),
        );
        actions.push(SettlersAction::EndTurn);
        actions
    }

    // === Transitions ===

    fn resolve(&self, action: &SettlersAction) -> Vec<Outcome<Self>> {
        let actor = self.current;
        match *action {
            SettlersAction::Roll => (2..=12)
                .map(|roll| Outcome::new(self.after_roll(roll), roll_probability(roll)))
                .collect(),
            SettlersAction::MoveRobber(tile) => self.robber_outcomes(tile, false),
            SettlersAction::PlayKnight(tile) => self.robber_outcomes(tile, true),
            SettlersAction::BuyDevelopmentCard => {
                let mut paid = self.clone();
                paid.players[actor].pay(DEVELOPMENT_CARD_COST);

                let mut knight = paid.clone();
                knight.players[actor].fresh_knights += 1;
                let mut point = paid;
                point.players[actor].victory_cards += 1;

                vec![
                    Outcome::new(knight.finished(actor), KNIGHT_PROBABILITY),
                    Outcome::new(point.finished(actor), 1.0 - KNIGHT_PROBABILITY),
                ]
            }
            _ => {
                let mut next = self.clone();
                next.apply_certain(action);
                vec![Outcome::certain(next)]
            }
        }
    }

    fn apply_certain(&mut self, action: &SettlersAction) {
        let actor = self.current;
        match *action {
            SettlersAction::PlaceInitial(spot) => self.place_initial(spot),
            SettlersAction::BuildSettlement(spot) => {
                self.players[actor].pay(SETTLEMENT_COST);
                self.players[actor].settlements += 1;
                self.buildings.set(spot, Some(Building { owner: actor, city: false }));
            }
            SettlersAction::BuildCity(spot) => {
                self.players[actor].pay(CITY_COST);
                self.players[actor].settlements = self.players[actor].settlements.saturating_sub(1);
                self.players[actor].cities += 1;
                self.buildings.set(spot, Some(Building { owner: actor, city: true }));
            }
            SettlersAction::BuildRoad(edge) => {
                self.players[actor].pay(ROAD_COST);
                self.players[actor].roads += 1;
                self.roads.set(edge, Some(actor));
            }
            SettlersAction::MaritimeTrade(offer) => {
                let hand = &mut self.players[actor].hand;
                hand[offer.give.index()] = hand[offer.give.index()].saturating_sub(offer.ratio);
                hand[offer.receive.index()] = hand[offer.receive.index()].saturating_add(1);
            }
            SettlersAction::EndTurn => {
                self.end_turn();
                return;
            }
            // Chance actions are resolved in `resolve`.
            SettlersAction::Roll
            | SettlersAction::MoveRobber(_)
            | SettlersAction::PlayKnight(_)
            | SettlersAction::BuyDevelopmentCard => return,
        }
        self.finish(actor);
    }

    fn place_initial(&mut self, spot: usize) {
        let Phase::Setup { placement } = self.phase else {
            return;
        };
        let actor = self.current;

        self.buildings.set(spot, Some(Building { owner: actor, city: false }));
        self.players[actor].settlements += 1;

        let free_edge = self
            .board
            .spot(spot)
            .edges
            .iter()
            .copied()
            .find(|&e| self.road(e).is_none());
        if let Some(edge) = free_edge {
            self.roads.set(edge, Some(actor));
            self.players[actor].roads += 1;
        }

        // The second settlement pays out its tiles once.
        if usize::from(placement) >= self.player_count() {
            for &tile in &self.board.spot(spot).tiles {
                if let Some(resource) = self.board.tile(tile).resource {
                    let held = &mut self.players[actor].hand[resource.index()];
                    *held = held.saturating_add(1);
                }
            }
        }

        let placed = placement + 1;
        if usize::from(placed) == 2 * self.player_count() {
            self.phase = Phase::NEW_TURN;
            self.current = PlayerId::new(0);
        } else {
            self.phase = Phase::Setup { placement: placed };
            self.current = self.setup_player(placed);
        }
    }

    fn after_roll(&self, roll: u8) -> Self {
        let actor = self.current;
        let mut next = self.clone();
        let knight_played = matches!(self.phase, Phase::Turn { knight_played: true, .. });
        next.phase = Phase::Turn {
            rolled: true,
            robber_pending: roll == 7,
            knight_played,
        };

        if roll == 7 {
            for player in PlayerId::all(next.player_count()) {
                next.discard_half(player);
            }
        } else {
            next.produce(roll);
        }
        next.finished(actor)
    }

    fn produce(&mut self, roll: u8) {
        for spot in 0..self.buildings.len() {
            let Some(building) = self.building(spot) else {
                continue;
            };
            let amount = if building.city { 2 } else { 1 };
            for &tile in &self.board.spot(spot).tiles {
                let t = self.board.tile(tile);
                if tile == self.robber || t.number != Some(roll) {
                    continue;
                }
                if let Some(resource) = t.resource {
                    let held = &mut self.players[building.owner].hand[resource.index()];
                    *held = held.saturating_add(amount);
                }
            }
        }
    }

    /// Drop half of an oversized hand, always from the largest pile.
    fn discard_half(&mut self, player: PlayerId) {
        let cards = self.players[player].cards();
        if cards <= HAND_LIMIT {
            return;
        }
        let hand = &mut self.players[player].hand;
        for _ in 0..cards / 2 {
            let mut largest = 0;
            for i in 1..hand.len() {
                if hand[i] > hand[largest] {
                    largest = i;
                }
            }
            hand[largest] -= 1;
        }
    }

    fn robber_outcomes(&self, tile: usize, knight: bool) -> Vec<Outcome<Self>> {
        let actor = self.current;
        let mut moved = self.clone();
        moved.robber = tile;

        if knight {
            let me = &mut moved.players[actor];
            me.knights = me.knights.saturating_sub(1);
            me.knights_played += 1;
            if let Phase::Turn { rolled, robber_pending, .. } = moved.phase {
                moved.phase = Phase::Turn {
                    rolled,
                    robber_pending,
                    knight_played: true,
                };
            }
        } else if let Phase::Turn { rolled, knight_played, .. } = moved.phase {
            moved.phase = Phase::Turn {
                rolled,
                robber_pending: false,
                knight_played,
            };
        }

        let Some(victim) = moved.steal_victim(tile, actor) else {
            return vec![Outcome::certain(moved.finished(actor))];
        };

        let hand = moved.players[victim].hand;
        let total = f64::from(moved.players[victim].cards());
        Resource::ALL
            .iter()
            .filter(|r| hand[r.index()] > 0)
            .map(|r| {
                let mut robbed = moved.clone();
                robbed.players[victim].hand[r.index()] -= 1;
                let taken = &mut robbed.players[actor].hand[r.index()];
                *taken = taken.saturating_add(1);
                Outcome::new(robbed.finished(actor), f64::from(hand[r.index()]) / total)
            })
            .collect()
    }

    /// First opponent after `actor` with a building on `tile` and cards.
    fn steal_victim(&self, tile: usize, actor: PlayerId) -> Option<PlayerId> {
        let n = self.player_count();
        let mut player = actor.next(n);
        while player != actor {
            if self.players[player].cards() > 0 && self.owns_on_tile(player, tile) {
                return Some(player);
            }
            player = player.next(n);
        }
        None
    }

    fn owns_on_tile(&self, player: PlayerId, tile: usize) -> bool {
        self.board.spots().iter().enumerate().any(|(spot, s)| {
            s.tiles.contains(&tile) && matches!(self.building(spot), Some(b) if b.owner == player)
        })
    }

    fn end_turn(&mut self) {
        let actor = self.current;
        let me = &mut self.players[actor];
        me.knights += me.fresh_knights;
        me.fresh_knights = 0;

        self.turn += 1;
        if self.turn >= self.max_turns {
            self.phase = Phase::Finished;
            return;
        }
        self.current = actor.next(self.player_count());
        self.phase = Phase::NEW_TURN;
    }

    fn finished(mut self, actor: PlayerId) -> Self {
        self.finish(actor);
        self
    }

    /// Refresh the bonuses and end the game if `actor` reached the target.
    fn finish(&mut self, actor: PlayerId) {
        let roads: Vec<u32> = PlayerId::all(self.player_count())
            .map(|p| self.road_length(p))
            .collect();
        self.longest_road = award(self.longest_road, &roads, LONGEST_ROAD_MIN);

        let knights: Vec<u32> = self
            .players
            .iter()
            .map(|(_, p)| u32::from(p.knights_played))
            .collect();
        self.largest_army = award(self.largest_army, &knights, LARGEST_ARMY_MIN);

        if self.victory_points(actor) >= self.target_points {
            self.winner = Some(actor);
            self.phase = Phase::Finished;
        }
    }
}

/// New holder of a bonus given everyone's score.
///
/// The holder keeps it until someone strictly beats them; nobody holds it
/// below `minimum`.
fn award(holder: Option<PlayerId>, scores: &[u32], minimum: u32) -> Option<PlayerId> {
    let mut best: Option<usize> = None;
    for (i, &score) in scores.iter().enumerate() {
        if best.map_or(true, |b| score > scores[b]) {
            best = Some(i);
        }
    }
    let best = best?;

    match holder {
        Some(h) if scores[h.index()] >= minimum && scores[h.index()] >= scores[best] => Some(h),
        _ if scores[best] >= minimum => Some(PlayerId::new(best as u8)),
        _ => None,
    }
}

impl GameState for SettlersState {
    type Action = SettlersAction;

    fn current_player(&self) -> PlayerId {
        self.current
    }

    fn legal_actions(&self) -> Vec<SettlersAction> {
        match self.phase {
            Phase::Finished => Vec::new(),
            Phase::Setup { .. } => (0..self.buildings.len())
                .filter(|&s| self.spot_open(s))
                .map(SettlersAction::PlaceInitial)
                .collect(),
            Phase::Turn {
                robber_pending: true,
                ..
            } => self.robber_moves(SettlersAction::MoveRobber),
            Phase::Turn {
                rolled: false,
                knight_played,
                ..
            } => {
                let mut actions = vec![SettlersAction::Roll];
                if self.players[self.current].knights > 0 && !knight_played {
                    actions.extend(self.robber_moves(SettlersAction::PlayKnight));
                }
                actions
            }
            Phase::Turn { knight_played, .. } => self.main_actions(self.current, knight_played),
        }
    }

    /// Chance actions are resolved with the state's own RNG.
    fn apply(&self, action: &SettlersAction) -> Self {
        let mut outcomes = self.resolve(action);
        if outcomes.len() <= 1 {
            return match outcomes.pop() {
                Some(o) => o.state,
                None => self.clone(),
            };
        }

        let mut rng = self.rng.clone();
        let weights: Vec<f64> = outcomes.iter().map(|o| o.probability).collect();
        let idx = rng.choose_weighted(&weights).unwrap_or(0);
        let mut next = outcomes.swap_remove(idx).state;
        next.rng = rng;
        next
    }

    fn is_terminal(&self) -> bool {
        self.phase == Phase::Finished
    }

    fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    fn expand(&self, action: &SettlersAction) -> Vec<Outcome<Self>> {
        self.resolve(action)
    }

    fn is_forced(&self, action: &SettlersAction) -> bool {
        matches!(action, SettlersAction::Roll | SettlersAction::EndTurn)
    }
}

impl BoardView for SettlersState {
    fn players(&self) -> Vec<PlayerId> {
        PlayerId::all(self.player_count()).collect()
    }

    fn action_family(&self, action: &SettlersAction) -> ActionFamily {
        action.family()
    }

    fn victory_points(&self, player: PlayerId) -> u32 {
        let p = &self.players[player];
        let mut points =
            u32::from(p.settlements) + 2 * u32::from(p.cities) + u32::from(p.victory_cards);
        if self.longest_road == Some(player) {
            points += 2;
        }
        if self.largest_army == Some(player) {
            points += 2;
        }
        points
    }

    fn longest_road_length(&self, player: PlayerId) -> u32 {
        self.road_length(player)
    }

    fn development_cards_in_hand(&self, player: PlayerId) -> u32 {
        let p = &self.players[player];
        u32::from(p.knights) + u32::from(p.fresh_knights) + u32::from(p.victory_cards)
    }

    fn development_cards_played(&self, player: PlayerId) -> u32 {
        u32::from(self.players[player].knights_played)
    }

    fn knights_played(&self, player: PlayerId) -> u32 {
        u32::from(self.players[player].knights_played)
    }

    fn resource_cards_in_hand(&self, player: PlayerId) -> u32 {
        self.players[player].cards()
    }

    fn buildable_spot_count(&self, player: PlayerId) -> usize {
        let setup = matches!(self.phase, Phase::Setup { .. });
        (0..self.buildings.len())
            .filter(|&s| {
                if setup {
                    self.spot_open(s)
                } else {
                    self.can_settle(player, s)
                }
            })
            .count()
    }

    fn production(&self, player: PlayerId) -> ResourceVector {
        let mut production = ResourceVector::default();
        for spot in 0..self.buildings.len() {
            let Some(building) = self.building(spot).filter(|b| b.owner == player) else {
                continue;
            };
            let amount = if building.city { 2.0 } else { 1.0 };
            for &tile in &self.board.spot(spot).tiles {
                if tile == self.robber {
                    continue;
                }
                let t = self.board.tile(tile);
                if let (Some(resource), Some(number)) = (t.resource, t.number) {
                    production[resource] += amount * roll_probability(number);
                }
            }
        }
        production
    }

    fn reachable_production(&self, player: PlayerId) -> ResourceVector {
        let mut production = ResourceVector::default();
        for spot in 0..self.buildings.len() {
            if !self.spot_open(spot) || self.touches_own_road(player, spot) {
                continue;
            }
            let reachable = self.board.spot(spot).edges.iter().any(|&e| {
                self.road(e).is_none() && self.network_node(player, self.board.other_end(e, spot))
            });
            if reachable {
                production = production + self.board.spot_production(spot);
            }
        }
        production
    }

    fn spot_production(&self, action: &SettlersAction) -> Option<ResourceVector> {
        action.settlement_spot().map(|s| self.board.spot_production(s))
    }

    fn spot_tile_count(&self, action: &SettlersAction) -> Option<usize> {
        action.settlement_spot().map(|s| self.board.spot(s).tiles.len())
    }

    fn robber_target(&self, action: &SettlersAction) -> Option<usize> {
        action.robber_tile()
    }

    fn opponent_buildings_on_tile(&self, tile: usize, player: PlayerId) -> usize {
        self.board
            .spots()
            .iter()
            .enumerate()
            .filter(|(spot, s)| {
                s.tiles.contains(&tile)
                    && matches!(self.building(*spot), Some(b) if b.owner != player)
            })
            .count()
    }

    fn trade_offer(&self, action: &SettlersAction) -> Option<TradeOffer> {
        match action {
            SettlersAction::MaritimeTrade(offer) => Some(*offer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::outcomes;

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);

    /// Play the opening with the first legal spot each time.
    fn after_setup(seed: u64) -> SettlersState {
        let mut state = SettlersBuilder::new().build(seed);
        while matches!(state.phase(), Phase::Setup { .. }) {
            let action = state.legal_actions()[0];
            state = state.apply(&action);
        }
        state
    }

    /// Main phase of player 0's first turn, after rolling a 2.
    fn main_phase(seed: u64) -> SettlersState {
        after_setup(seed)
            .expand(&SettlersAction::Roll)
            .swap_remove(0)
            .state
    }

    #[test]
    fn test_snake_order_setup() {
        let mut state = SettlersBuilder::new().build(1);
        let mut movers = Vec::new();
        while matches!(state.phase(), Phase::Setup { .. }) {
            movers.push(state.current_player());
            let action = state.legal_actions()[0];
            state = state.apply(&action);
        }

        assert_eq!(movers, vec![P0, P1, P1, P0]);
        assert_eq!(state.phase(), Phase::NEW_TURN);
        assert_eq!(state.current_player(), P0);
        assert_eq!(state.player(P0).settlements, 2);
        assert_eq!(state.player(P0).roads, 2);
        // Second placement pays out.
        assert!(state.player(P0).cards() > 0);
    }

    #[test]
    fn test_setup_respects_distance_rule() {
        let state = SettlersBuilder::new().build(1);
        let placed = state.apply(&SettlersAction::PlaceInitial(0));
        let legal = placed.legal_actions();

        assert!(!legal.contains(&SettlersAction::PlaceInitial(0)));
        assert!(!legal.contains(&SettlersAction::PlaceInitial(1)));
        assert!(!legal.contains(&SettlersAction::PlaceInitial(9)));
        assert!(legal.contains(&SettlersAction::PlaceInitial(2)));
    }

    #[test]
    fn test_roll_expands_to_eleven_outcomes() {
        let state = after_setup(4);
        assert_eq!(state.legal_actions(), vec![SettlersAction::Roll]);
        assert!(state.is_forced(&SettlersAction::Roll));

        let outcomes = outcomes(&state, &SettlersAction::Roll).unwrap();
        assert_eq!(outcomes.len(), 11);

        // Index 5 is a 7.
        let seven = &outcomes[5].state;
        assert!(matches!(seven.phase(), Phase::Turn { robber_pending: true, .. }));
        assert!(seven
            .legal_actions()
            .iter()
            .all(|a| matches!(a, SettlersAction::MoveRobber(_))));
    }

    #[test]
    fn test_seven_discards_half() {
        let state = after_setup(4).with_hand(P1, [5, 4, 0, 0, 0]);
        let seven = state.expand(&SettlersAction::Roll).swap_remove(5).state;
        assert_eq!(seven.player(P1).cards(), 5);
        assert_eq!(seven.player(P1).hand, [2, 3, 0, 0, 0]);
    }

    #[test]
    fn test_robber_steals_from_opponent() {
        let state = after_setup(4).with_hand(P1, [2, 0, 1, 0, 0]);
        let seven = state.expand(&SettlersAction::Roll).swap_remove(5).state;

        let victim_spot = (0..seven.board().spots().len())
            .find(|&s| matches!(seven.building(s), Some(b) if b.owner == P1))
            .unwrap();
        let tile = seven.board().spot(victim_spot).tiles[0];
        let action = if tile == seven.robber() {
            SettlersAction::MoveRobber(seven.board().spot(victim_spot).tiles[1])
        } else {
            SettlersAction::MoveRobber(tile)
        };

        let outcomes = outcomes(&seven, &action).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!((outcomes[0].probability - 2.0 / 3.0).abs() < 1e-12);
        for o in &outcomes {
            assert_eq!(o.state.player(P1).cards(), 2);
            assert!(matches!(o.state.phase(), Phase::Turn { robber_pending: false, .. }));
        }
    }

    #[test]
    fn test_full_piles_saturate() {
        let state = main_phase(4).with_hand(P0, [4, 0, 0, 0, u8::MAX]);
        let trade = state
            .legal_actions()
            .into_iter()
            .find(|a| {
                matches!(a, SettlersAction::MaritimeTrade(o)
                    if o.give == Resource::ALL[0] && o.receive == Resource::ALL[4])
            })
            .unwrap();
        let traded = state.apply(&trade);
        assert_eq!(traded.player(P0).hand[4], u8::MAX);

        let seven = after_setup(4)
            .with_hand(P1, [2, 0, 1, 0, 0])
            .expand(&SettlersAction::Roll)
            .swap_remove(5)
            .state
            .with_hand(P0, [u8::MAX, 0, 0, 0, 0]);
        let victim_spot = (0..seven.board().spots().len())
            .find(|&s| matches!(seven.building(s), Some(b) if b.owner == P1))
            .unwrap();
        let tiles = &seven.board().spot(victim_spot).tiles;
        let tile = if tiles[0] == seven.robber() { tiles[1] } else { tiles[0] };

        let outcomes = outcomes(&seven, &SettlersAction::MoveRobber(tile)).unwrap();
        assert_eq!(outcomes[0].state.player(P0).hand[0], u8::MAX);
        assert_eq!(outcomes[0].state.player(P1).hand[0], 1);
    }

    #[test]
    fn test_main_phase_actions() {
        let state = main_phase(4).with_hand(P0, [4, 1, 1, 1, 0]);
        let legal = state.legal_actions();

        assert_eq!(legal.last(), Some(&SettlersAction::EndTurn));
        assert!(legal.iter().any(|a| matches!(a, SettlersAction::BuildRoad(_))));
        assert!(legal.iter().any(|a| matches!(a, SettlersAction::MaritimeTrade(o) if o.ratio == 4)));
        assert!(!legal.contains(&SettlersAction::BuyDevelopmentCard));
    }

    #[test]
    fn test_development_card_outcomes() {
        let state = main_phase(4).with_hand(P0, [0, 0, 1, 1, 1]);
        let outcomes = outcomes(&state, &SettlersAction::BuyDevelopmentCard).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].state.player(P0).fresh_knights, 1);
        assert_eq!(outcomes[1].state.player(P0).victory_cards, 1);
        assert_eq!(outcomes[0].state.player(P0).cards(), 0);
        // Fresh knights cannot be played this turn.
        assert!(!outcomes[0]
            .state
            .legal_actions()
            .iter()
            .any(|a| matches!(a, SettlersAction::PlayKnight(_))));
    }

    #[test]
    fn test_knight_before_roll() {
        let state = after_setup(4).with_knights(P0, 1);
        let legal = state.legal_actions();
        assert_eq!(legal[0], SettlersAction::Roll);
        assert!(!state.is_forced(&legal[1]));

        let played = state.apply(&legal[1]);
        assert_eq!(played.player(P0).knights_played, 1);
        assert_eq!(played.legal_actions(), vec![SettlersAction::Roll]);
    }

    #[test]
    fn test_end_turn_passes_and_caps() {
        let state = main_phase(4);
        let next = state.apply(&SettlersAction::EndTurn);
        assert_eq!(next.current_player(), P1);
        assert_eq!(next.turn(), 1);

        let capped = SettlersBuilder::new().max_turns(1).build(4);
        let mut s = capped;
        while matches!(s.phase(), Phase::Setup { .. }) {
            let a = s.legal_actions()[0];
            s = s.apply(&a);
        }
        let s = s.expand(&SettlersAction::Roll).swap_remove(0).state;
        let done = s.apply(&SettlersAction::EndTurn);
        assert!(done.is_terminal());
        assert_eq!(done.winner(), None);
    }

    #[test]
    fn test_award_rules() {
        assert_eq!(award(None, &[4, 3], 5), None);
        assert_eq!(award(None, &[5, 3], 5), Some(P0));
        assert_eq!(award(Some(P0), &[5, 5], 5), Some(P0));
        assert_eq!(award(Some(P0), &[5, 6], 5), Some(P1));
        assert_eq!(award(Some(P0), &[2, 4], 3), Some(P1));
    }

    #[test]
    fn test_board_view_features() {
        let state = after_setup(4);
        let production = state.production(P0);
        assert!(production.total() > 0.0);
        assert_eq!(state.victory_points(P0), 2);
        assert_eq!(state.longest_road_length(P0), 1);
        assert_eq!(state.players(), vec![P0, P1]);
        assert_eq!(state.opponents(P0), vec![P1]);
        assert_eq!(state.spot_tile_count(&SettlersAction::PlaceInitial(9)), Some(1));
        assert_eq!(state.robber_target(&SettlersAction::PlayKnight(3)), Some(3));
    }

    #[test]
    fn test_random_playout_terminates() {
        let mut state = SettlersBuilder::new().max_turns(60).build(9);
        let mut rng = SearchRng::new(9);
        let mut steps = 0;
        while !state.is_terminal() {
            let legal = state.legal_actions();
            let action = *rng.choose(&legal).unwrap();
            state = state.apply(&action);
            steps += 1;
            assert!(steps < 100_000);
        }
        assert!(state.turn() <= 60);
    }
}

//! Open-outcry auction for titles the bank still holds.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::tile_spec;
use crate::economy::negotiation::completes_group;
use crate::economy::valuation::{max_money, reserve};
use crate::game::action::GameEvent;
use crate::game::{GameError, GameState};
use crate::players::BasePlayer;
use crate::types::{Money, PlayerId, TileId, TileKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    Open,
    Bidding { cursor: PlayerId },
    Closed { outcome: Option<(PlayerId, Money)> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    tile: TileId,
    min_increase: Money,
    bids: Vec<Option<Money>>,
    folded: Vec<bool>,
    highest: Option<(PlayerId, Money)>,
    phase: AuctionPhase,
}

impl Auction {
    /// Eliminated players start out folded.
    pub fn new(state: &GameState, tile: TileId) -> Self {
        Self {
            tile,
            min_increase: state.config.min_bid_increase,
            bids: vec![None; state.players.len()],
            folded: state.players.iter().map(|p| !p.is_active()).collect(),
            highest: None,
            phase: AuctionPhase::Open,
        }
    }

    pub fn tile(&self) -> TileId {
        self.tile
    }

    pub fn phase(&self) -> AuctionPhase {
        self.phase
    }

    pub fn highest_bid(&self) -> Money {
        self.highest.map_or(0, |(_, bid)| bid)
    }

    pub fn highest_bidder(&self) -> Option<PlayerId> {
        self.highest.map(|(bidder, _)| bidder)
    }

    /// Best accepted bid of every seat so far.
    pub fn bids(&self) -> &[Option<Money>] {
        &self.bids
    }

    pub fn has_folded(&self, player: PlayerId) -> bool {
        self.folded.get(player).copied().unwrap_or(true)
    }

    /// Smallest bid that does not count as a fold.
    pub fn min_valid_bid(&self) -> Money {
        self.highest_bid() + self.min_increase
    }

    /// `None` while bidding continues; the winner and price (or nobody) once closed.
    pub fn outcome(&self) -> Option<Option<(PlayerId, Money)>> {
        match self.phase {
            AuctionPhase::Closed { outcome } => Some(outcome),
            _ => None,
        }
    }

    /// Player whose bid is awaited, opening the auction on first call.
    pub fn next_bidder(&mut self) -> Option<PlayerId> {
        if self.phase == AuctionPhase::Open {
            self.advance(0);
        }
        match self.phase {
            AuctionPhase::Bidding { cursor } => Some(cursor),
            _ => None,
        }
    }

    /// Records the current bidder's answer. Anything below [`Auction::min_valid_bid`] is a
    /// fold. Returns whether the bid was taken.
    pub fn submit(&mut self, bid: Money) -> bool {
        let AuctionPhase::Bidding { cursor } = self.phase else {
            return false;
        };
        let accepted = bid >= self.min_valid_bid();
        if accepted {
            self.bids[cursor] = Some(bid);
            self.highest = Some((cursor, bid));
        } else {
            self.folded[cursor] = true;
        }
        self.advance(cursor + 1);
        accepted
    }

    /// Moves the cursor to the next seat still in, closing once it comes back round to
    /// the high bidder or nobody is left.
    fn advance(&mut self, from: PlayerId) {
        let seats = self.folded.len();
        for step in 0..seats {
            let seat = (from + step) % seats;
            if self.highest_bidder() == Some(seat) {
                break;
            }
            if !self.folded[seat] {
                self.phase = AuctionPhase::Bidding { cursor: seat };
                return;
            }
        }
        self.phase = AuctionPhase::Closed {
            outcome: self.highest,
        };
    }
}

/// Auctions an unowned `tile` among the active players. The winner pays the bank through
/// the regular spend path; when the money cannot be raised the tile stays with the bank
/// and the bidder stays in the game.
pub fn run_auction<P: BasePlayer>(
    state: &mut GameState,
    players: &[P],
    tile: TileId,
) -> Result<Option<(PlayerId, Money)>, GameError> {
    if players.len() != state.players.len() {
        return Err(GameError::SeatMismatch {
            expected: state.players.len(),
            actual: players.len(),
        });
    }
    let asset = state.board.asset(tile).ok_or(GameError::NotOwnable(tile))?;
    if asset.owner.is_some() {
        return Err(GameError::AlreadyOwned(tile));
    }

    state.push_event(GameEvent::AuctionStart { tile });
    let mut auction = Auction::new(state, tile);
    while let Some(bidder) = auction.next_bidder() {
        let bid = players[bidder].bid(state, bidder, &auction);
        let accepted = auction.submit(bid);
        debug!(tile, bidder, bid, accepted, "auction bid");
    }

    let Some(Some((winner, bid))) = auction.outcome() else {
        info!(tile, "auction closed without bids");
        state.push_event(GameEvent::AuctionUnsold { tile });
        return Ok(None);
    };
    if !state.try_spend(players, winner, bid, None)? {
        info!(tile, winner, bid, "auction winner could not pay");
        state.push_event(GameEvent::AuctionUnsold { tile });
        return Ok(None);
    }
    state.assign_title(tile, Some(winner))?;
    info!(tile, winner, bid, "auction won");
    state.push_event(GameEvent::AuctionEnd { tile, winner, bid });
    Ok(Some((winner, bid)))
}

/// Bid the heuristic agents place: one increment over the high bid while it stays below
/// their ceiling, otherwise a fold.
pub fn suggested_bid(state: &GameState, me: PlayerId, auction: &Auction) -> Money {
    let tile = auction.tile();
    let spec = tile_spec(tile);
    let cost = spec.cost as f64;
    let cash = state.cash(me) as f64;

    let mut ceiling = match state.board.asset(tile) {
        Some(asset) if asset.mortgaged => {
            cost * state.config.unmortgage_multiplier * state.config.late_unmortgage_multiplier
        }
        _ => cost,
    };
    if cash >= ceiling * 1.3 {
        ceiling *= 1.3;
    }
    if ceiling > cash {
        ceiling = cash;
    }
    if spec.kind == TileKind::Property {
        if completes_group(state, me, tile) {
            ceiling = cost * 2.0;
        }
        if let Some(leader) = auction.highest_bidder() {
            if completes_group(state, leader, tile) {
                ceiling = cost * 1.6;
            }
        }
    }
    let liquid = (max_money(state, me) - reserve(state, me, false)) as f64 / 2.0;
    if liquid < ceiling {
        ceiling = liquid;
    }

    if (auction.highest_bid() as f64) < ceiling {
        auction.min_valid_bid()
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::players::ScriptedPlayer;

    fn make_state(num_players: usize) -> GameState {
        GameState::new(GameConfig {
            num_players,
            ..GameConfig::default()
        })
        .unwrap()
    }

    fn bidders(scripts: &[&[Money]]) -> Vec<ScriptedPlayer> {
        scripts
            .iter()
            .map(|bids| ScriptedPlayer::with_bids(bids.iter().copied()))
            .collect()
    }

    #[test]
    fn single_bidder_wins_at_its_bid() {
        let mut state = make_state(3);
        let players = bidders(&[&[0], &[0], &[50]]);
        let outcome = run_auction(&mut state, &players, 15).unwrap();
        assert_eq!(outcome, Some((2, 50)));
        assert_eq!(state.board.owner(15), Some(2));
        assert_eq!(state.cash(2), 1450);
        assert_eq!(state.cash(0), 1500);
        assert!(matches!(
            state.log.current_turn().last(),
            Some(GameEvent::AuctionEnd { tile: 15, winner: 2, bid: 50 })
        ));
    }

    #[test]
    fn bidding_continues_until_the_leader_comes_round() {
        let mut state = make_state(3);
        let players = bidders(&[&[10, 15], &[20], &[0]]);
        let outcome = run_auction(&mut state, &players, 1).unwrap();
        assert_eq!(outcome, Some((1, 20)));
        assert_eq!(state.cash(1), 1480);
    }

    #[test]
    fn no_bids_leaves_the_tile_with_the_bank() {
        let mut state = make_state(2);
        let players = bidders(&[&[], &[]]);
        assert_eq!(run_auction(&mut state, &players, 5).unwrap(), None);
        assert_eq!(state.board.owner(5), None);
        assert!(matches!(
            state.log.current_turn().last(),
            Some(GameEvent::AuctionUnsold { tile: 5 })
        ));
    }

    #[test]
    fn bids_below_the_increment_fold() {
        let mut state = make_state(2);
        state.config.min_bid_increase = 10;
        let mut auction = Auction::new(&state, 1);
        assert_eq!(auction.next_bidder(), Some(0));
        assert!(!auction.submit(5));
        assert!(auction.has_folded(0));
        assert_eq!(auction.next_bidder(), Some(1));
        assert!(auction.submit(10));
        assert_eq!(auction.outcome(), Some(Some((1, 10))));
    }

    #[test]
    fn eliminated_players_are_never_asked() {
        let mut state = make_state(3);
        state.players[1].eliminated = true;
        let players = bidders(&[&[0], &[500], &[30]]);
        assert_eq!(run_auction(&mut state, &players, 3).unwrap(), Some((2, 30)));
        assert_eq!(players[1].remaining_bids(), 1);
    }

    #[test]
    fn winner_who_cannot_pay_keeps_its_seat() {
        let mut state = make_state(2);
        state.players[1].cash = 10;
        let players = bidders(&[&[0], &[500]]);
        assert_eq!(run_auction(&mut state, &players, 39).unwrap(), None);
        assert_eq!(state.board.owner(39), None);
        assert!(state.is_active(1));
        assert_eq!(state.cash(1), 10);
    }

    #[test]
    fn owned_tiles_cannot_be_auctioned() {
        let mut state = make_state(2);
        state.assign_title(1, Some(0)).unwrap();
        let players = bidders(&[&[], &[]]);
        assert!(matches!(
            run_auction(&mut state, &players, 1),
            Err(GameError::AlreadyOwned(1))
        ));
    }

    #[test]
    fn heuristic_pays_up_to_complete_a_group() {
        let mut state = make_state(2);
        state.assign_title(37, Some(1)).unwrap();

        let mut auction = Auction::new(&state, 39);
        auction.next_bidder();
        auction.submit(700);
        // Ceiling is half of (1675 - 120), below the 800 a completing tile would justify.
        assert_eq!(suggested_bid(&state, 1, &auction), 701);

        let mut auction = Auction::new(&state, 39);
        auction.next_bidder();
        auction.submit(780);
        assert_eq!(suggested_bid(&state, 1, &auction), 0);
    }

    #[test]
    fn heuristic_stops_near_cost() {
        let state = make_state(2);
        let mut auction = Auction::new(&state, 1);
        auction.next_bidder();
        auction.submit(77);
        assert_eq!(suggested_bid(&state, 1, &auction), 78);

        let mut auction = Auction::new(&state, 1);
        auction.next_bidder();
        auction.submit(78);
        assert_eq!(suggested_bid(&state, 1, &auction), 0);
    }
}

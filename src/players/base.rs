use crate::economy::auction::Auction;
use crate::economy::liquidation;
use crate::game::trade::TradeOffer;
use crate::game::{GameError, GameState};
use crate::types::{JailChoice, Money, PlayerId, TileId};

/// Decisions the orchestrator asks of a seat. Queries get a shared view of the game;
/// `make_money` and `end_turn` may act on it and on the other seats through `players`.
pub trait BasePlayer {
    fn want_out_of_jail(&self, state: &GameState, me: PlayerId) -> JailChoice;

    fn will_buy(&self, state: &GameState, me: PlayerId, tile: TileId) -> bool;

    /// Anything below [`Auction::min_valid_bid`] folds.
    fn bid(&self, state: &GameState, me: PlayerId, auction: &Auction) -> Money;

    fn receive_trade_offer(&self, state: &GameState, me: PlayerId, offer: &TradeOffer) -> bool;

    /// Raises `shortfall` in cash and returns what could not be raised.
    fn make_money<P: BasePlayer>(
        &self,
        state: &mut GameState,
        players: &[P],
        me: PlayerId,
        shortfall: Money,
    ) -> Money {
        let policy = state.config.policy.clone();
        liquidation::raise(state, players, me, shortfall, &policy)
    }

    fn end_turn<P: BasePlayer>(
        &self,
        _state: &mut GameState,
        _players: &[P],
        _me: PlayerId,
    ) -> Result<(), GameError> {
        Ok(())
    }
}

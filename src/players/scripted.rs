use std::cell::RefCell;
use std::collections::VecDeque;

use crate::economy::auction::Auction;
use crate::game::GameState;
use crate::game::trade::{TradeOffer, cash_in};
use crate::players::BasePlayer;
use crate::types::{JailChoice, Money, PlayerId, TileId};

/// Replays fixed answers. The default seat never buys, never bids, stays in jail and
/// declines every trade.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPlayer {
    pub buy: bool,
    pub jail_choice: JailChoice,
    /// Accepts any offer costing it at most this much cash; `None` declines everything.
    pub trade_budget: Option<Money>,
    pub(crate) bids: RefCell<VecDeque<Money>>,
}

impl ScriptedPlayer {
    /// Bids are consumed one per call; an exhausted script folds.
    pub fn with_bids(bids: impl IntoIterator<Item = Money>) -> Self {
        Self {
            bids: RefCell::new(bids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn remaining_bids(&self) -> usize {
        self.bids.borrow().len()
    }
}

impl BasePlayer for ScriptedPlayer {
    fn want_out_of_jail(&self, _state: &GameState, _me: PlayerId) -> JailChoice {
        self.jail_choice
    }

    fn will_buy(&self, _state: &GameState, _me: PlayerId, _tile: TileId) -> bool {
        self.buy
    }

    fn bid(&self, _state: &GameState, _me: PlayerId, _auction: &Auction) -> Money {
        self.bids.borrow_mut().pop_front().unwrap_or(0)
    }

    fn receive_trade_offer(&self, _state: &GameState, me: PlayerId, offer: &TradeOffer) -> bool {
        self.trade_budget
            .is_some_and(|budget| cash_in(offer.given_by(me)) <= budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::game::trade::TradeItem;

    #[test]
    fn replays_bids_then_folds() {
        let state = GameState::new(GameConfig::default()).unwrap();
        let player = ScriptedPlayer::with_bids([10, 20]);
        let auction = Auction::new(&state, 1);
        assert_eq!(player.bid(&state, 0, &auction), 10);
        assert_eq!(player.bid(&state, 0, &auction), 20);
        assert_eq!(player.bid(&state, 0, &auction), 0);
        assert_eq!(player.remaining_bids(), 0);
    }

    #[test]
    fn trade_budget_bounds_acceptance() {
        let state = GameState::new(GameConfig::default()).unwrap();
        let offer = TradeOffer::new(0, 1, [TradeItem::Tile(1)], [TradeItem::Cash(100)]);
        assert!(!ScriptedPlayer::default().receive_trade_offer(&state, 1, &offer));
        let generous = ScriptedPlayer {
            trade_budget: Some(100),
            ..ScriptedPlayer::default()
        };
        assert!(generous.receive_trade_offer(&state, 1, &offer));
        let stingy = ScriptedPlayer {
            trade_budget: Some(99),
            ..ScriptedPlayer::default()
        };
        assert!(!stingy.receive_trade_offer(&state, 1, &offer));
    }
}

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::types::{ColorGroup, Money, PlayerId, TileId};

use super::action::GameEvent;
use super::state::{GameError, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeItem {
    Tile(TileId),
    Cash(Money),
    JailCards(u32),
}

pub type TradeItems = SmallVec<[TradeItem; 4]>;

/// A proposed exchange between two players: `proposer` hands over `offered` in return
/// for `requested` from `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub proposer: PlayerId,
    pub recipient: PlayerId,
    pub offered: TradeItems,
    pub requested: TradeItems,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TradeError {
    #[error("a player cannot trade with itself")]
    SamePlayer,
    #[error("trade is empty")]
    Empty,
    #[error("player {0} is not an active participant")]
    InactiveParticipant(PlayerId),
    #[error("tile {0} cannot be traded")]
    NotTradable(TileId),
    #[error("tile {tile} is not owned by player {player}")]
    NotOwned { tile: TileId, player: PlayerId },
    #[error("{0} has buildings")]
    BuildingsOnGroup(ColorGroup),
    #[error("player {player} cannot give {needed} in cash, holds {available}")]
    InsufficientCash {
        player: PlayerId,
        needed: Money,
        available: Money,
    },
    #[error("player {player} holds {available} jail cards, {needed} requested")]
    InsufficientJailCards {
        player: PlayerId,
        needed: u32,
        available: u32,
    },
    #[error("negative amount in trade")]
    NegativeAmount,
}

impl TradeOffer {
    pub fn new(
        proposer: PlayerId,
        recipient: PlayerId,
        offered: impl IntoIterator<Item = TradeItem>,
        requested: impl IntoIterator<Item = TradeItem>,
    ) -> Self {
        Self {
            proposer,
            recipient,
            offered: offered.into_iter().collect(),
            requested: requested.into_iter().collect(),
        }
    }

    /// Items `player` gives away under this offer.
    pub fn given_by(&self, player: PlayerId) -> &[TradeItem] {
        if player == self.proposer {
            &self.offered
        } else {
            &self.requested
        }
    }

    /// Items `player` receives under this offer.
    pub fn received_by(&self, player: PlayerId) -> &[TradeItem] {
        if player == self.proposer {
            &self.requested
        } else {
            &self.offered
        }
    }

    pub fn counterpart(&self, player: PlayerId) -> PlayerId {
        if player == self.proposer {
            self.recipient
        } else {
            self.proposer
        }
    }
}

pub fn cash_in(items: &[TradeItem]) -> Money {
    items
        .iter()
        .map(|item| match item {
            TradeItem::Cash(amount) => *amount,
            _ => 0,
        })
        .sum()
}

pub fn jail_cards_in(items: &[TradeItem]) -> u32 {
    items
        .iter()
        .map(|item| match item {
            TradeItem::JailCards(count) => *count,
            _ => 0,
        })
        .sum()
}

pub fn tiles_in(items: &[TradeItem]) -> impl Iterator<Item = TileId> + '_ {
    items.iter().filter_map(|item| match item {
        TradeItem::Tile(tile) => Some(*tile),
        _ => None,
    })
}

impl GameState {
    /// Checks that both sides can deliver what the offer names.
    pub fn validate_offer(&self, offer: &TradeOffer) -> Result<(), TradeError> {
        if offer.proposer == offer.recipient {
            return Err(TradeError::SamePlayer);
        }
        if offer.offered.is_empty() && offer.requested.is_empty() {
            return Err(TradeError::Empty);
        }
        for (giver, items) in [
            (offer.proposer, &offer.offered),
            (offer.recipient, &offer.requested),
        ] {
            let Some(player) = self.players.get(giver).filter(|p| p.is_active()) else {
                return Err(TradeError::InactiveParticipant(giver));
            };
            for tile in tiles_in(items) {
                let asset = self.board.asset(tile).ok_or(TradeError::NotTradable(tile))?;
                if asset.owner != Some(giver) {
                    return Err(TradeError::NotOwned { tile, player: giver });
                }
                if let Some(group) = asset.spec().group {
                    if self.board.group_has_buildings(group) {
                        return Err(TradeError::BuildingsOnGroup(group));
                    }
                }
            }
            if items.iter().any(|item| matches!(item, TradeItem::Cash(amount) if *amount < 0)) {
                return Err(TradeError::NegativeAmount);
            }
            let cash = cash_in(items);
            if cash > player.cash {
                return Err(TradeError::InsufficientCash {
                    player: giver,
                    needed: cash,
                    available: player.cash,
                });
            }
            let cards = jail_cards_in(items);
            if cards > player.jail_cards {
                return Err(TradeError::InsufficientJailCards {
                    player: giver,
                    needed: cards,
                    available: player.jail_cards,
                });
            }
        }
        Ok(())
    }

    /// Carries out an accepted offer. Validation happens up front so either every item
    /// moves or nothing does.
    pub fn execute_trade(&mut self, offer: &TradeOffer) -> Result<(), GameError> {
        self.validate_offer(offer)?;
        debug!(
            proposer = offer.proposer,
            recipient = offer.recipient,
            "executing trade"
        );
        for (from, to, items) in [
            (offer.proposer, offer.recipient, &offer.offered),
            (offer.recipient, offer.proposer, &offer.requested),
        ] {
            for item in items.iter() {
                match *item {
                    TradeItem::Tile(tile) => {
                        let stamp = self.stamp();
                        if let Some(asset) = self.board.asset_mut(tile) {
                            asset.owner = Some(to);
                            asset.ownership_changed = stamp;
                        }
                        self.push_event(GameEvent::TradeTile { from, to, tile });
                    }
                    TradeItem::JailCards(count) if count > 0 => {
                        self.players[from].jail_cards -= count;
                        self.players[to].jail_cards += count;
                        self.push_event(GameEvent::TradeJailCard { from, to, count });
                    }
                    TradeItem::Cash(amount) if amount > 0 => {
                        self.transfer_cash(from, amount, Some(to));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

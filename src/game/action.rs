use serde::{Deserialize, Serialize};

use crate::types::{DeckKind, Money, PlayerId, TileId};

/// A single entry of the action log. Every variant names the acting player and, where
/// relevant, the tile and the balances that resulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Roll {
        player: PlayerId,
        dice: (u8, u8),
    },
    PassGo {
        player: PlayerId,
        amount: Money,
        cash: Money,
    },
    Land {
        player: PlayerId,
        tile: TileId,
        cash: Money,
    },
    Owns {
        player: PlayerId,
        tile: TileId,
    },
    Rent {
        player: PlayerId,
        owner: PlayerId,
        tile: TileId,
        amount: Money,
    },
    Spend {
        player: PlayerId,
        amount: Money,
        cash: Money,
    },
    Pay {
        player: PlayerId,
        to: PlayerId,
        amount: Money,
        cash: Money,
        to_cash: Money,
    },
    Earn {
        player: PlayerId,
        amount: Money,
        cash: Money,
    },
    ReceiveTitle {
        player: PlayerId,
        tile: TileId,
    },
    Mortgage {
        player: PlayerId,
        tile: TileId,
        amount: Money,
        cash: Money,
    },
    Unmortgage {
        player: PlayerId,
        tile: TileId,
        amount: Money,
        cash: Money,
    },
    Build {
        player: PlayerId,
        tile: TileId,
        buildings: u8,
        cash: Money,
    },
    Demolish {
        player: PlayerId,
        tile: TileId,
        buildings: u8,
        amount: Money,
        cash: Money,
    },
    TradeTile {
        from: PlayerId,
        to: PlayerId,
        tile: TileId,
    },
    TradeJailCard {
        from: PlayerId,
        to: PlayerId,
        count: u32,
    },
    AuctionStart {
        tile: TileId,
    },
    AuctionEnd {
        tile: TileId,
        winner: PlayerId,
        bid: Money,
    },
    AuctionUnsold {
        tile: TileId,
    },
    Bankrupt {
        player: PlayerId,
        creditor: Option<PlayerId>,
    },
    DrawCard {
        player: PlayerId,
        deck: DeckKind,
        card: u8,
    },
    Jail {
        player: PlayerId,
    },
    ThreeDoublesToJail {
        player: PlayerId,
    },
    UseJailCard {
        player: PlayerId,
    },
    PayJailFine {
        player: PlayerId,
    },
    DoublesOutOfJail {
        player: PlayerId,
    },
    StayInJail {
        player: PlayerId,
    },
}

impl GameEvent {
    pub fn player(&self) -> Option<PlayerId> {
        use GameEvent::*;
        match self {
            Roll { player, .. }
            | PassGo { player, .. }
            | Land { player, .. }
            | Owns { player, .. }
            | Rent { player, .. }
            | Spend { player, .. }
            | Pay { player, .. }
            | Earn { player, .. }
            | ReceiveTitle { player, .. }
            | Mortgage { player, .. }
            | Unmortgage { player, .. }
            | Build { player, .. }
            | Demolish { player, .. }
            | Bankrupt { player, .. }
            | DrawCard { player, .. }
            | Jail { player }
            | ThreeDoublesToJail { player }
            | UseJailCard { player }
            | PayJailFine { player }
            | DoublesOutOfJail { player }
            | StayInJail { player } => Some(*player),
            TradeTile { from, .. } | TradeJailCard { from, .. } => Some(*from),
            AuctionEnd { winner, .. } => Some(*winner),
            AuctionStart { .. } | AuctionUnsold { .. } => None,
        }
    }
}

/// Append-only record of everything that happened, grouped by turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    turns: Vec<Vec<GameEvent>>,
    current: Vec<GameEvent>,
}

impl ActionLog {
    pub(crate) fn push(&mut self, event: GameEvent) {
        self.current.push(event);
    }

    pub(crate) fn end_turn(&mut self) {
        if !self.current.is_empty() {
            self.turns.push(std::mem::take(&mut self.current));
        }
    }

    pub fn current_turn(&self) -> &[GameEvent] {
        &self.current
    }

    pub fn turns(&self) -> &[Vec<GameEvent>] {
        &self.turns
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.turns.iter().flatten().chain(self.current.iter())
    }

    pub fn len(&self) -> usize {
        self.turns.iter().map(Vec::len).sum::<usize>() + self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

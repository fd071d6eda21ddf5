#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod board;
pub mod cli;
pub mod economy;
pub mod game;
pub mod players;
pub mod types;

pub use board::{Board, OwnableAsset, TileSpec};
pub use economy::{Auction, LiquidationPlan, Bundle};
pub use game::{ActionLog, Game, GameConfig, GameError, GameEvent, GameState, TradeOffer};
pub use players::{AiPlayer, BasePlayer, RandomPlayer, ScriptedPlayer};
pub use types::{ColorGroup, Edition, Money, PlayerId, TileId};

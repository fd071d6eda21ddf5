pub mod action;
pub mod bank;
pub mod config;
pub mod game;
pub mod players;
pub mod rng;
pub mod state;
pub mod trade;

pub use action::{ActionLog, GameEvent};
pub use bank::Bank;
pub use config::{ConfigError, GameConfig, LiquidationClass, PolicyConfig};
pub use game::Game;
pub use players::PlayerState;
pub use rng::GameRng;
pub use state::{GameError, GameState};
pub use trade::{TradeError, TradeItem, TradeOffer};

pub mod ai;
pub mod base;
pub mod random;
pub mod scripted;

pub use ai::AiPlayer;
pub use base::BasePlayer;
pub use random::RandomPlayer;
pub use scripted::ScriptedPlayer;

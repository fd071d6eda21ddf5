use crate::economy::auction::Auction;
use crate::game::trade::TradeOffer;
use crate::game::{GameError, GameState};
use crate::players::{AiPlayer, BasePlayer, RandomPlayer, ScriptedPlayer};
use crate::types::{JailChoice, Money, PlayerId, TileId};

pub struct CliPlayer {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const CLI_PLAYERS: &[CliPlayer] = &[
    CliPlayer {
        code: "A",
        name: "AiPlayer",
        description: "Values holdings, trades toward sets, builds and bids by heuristics.",
    },
    CliPlayer {
        code: "R",
        name: "RandomPlayer",
        description: "Flips a coin for every affordable decision.",
    },
    CliPlayer {
        code: "S",
        name: "ScriptedPlayer",
        description: "Never bids or trades. Param 'buy' makes it buy every tile it can.",
    },
];

#[derive(Debug, Clone)]
pub enum PlayerInstance {
    Ai(AiPlayer),
    Random(RandomPlayer),
    Scripted(ScriptedPlayer),
}

impl PlayerInstance {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerInstance::Ai(_) => "Ai",
            PlayerInstance::Random(_) => "Random",
            PlayerInstance::Scripted(_) => "Scripted",
        }
    }
}

impl BasePlayer for PlayerInstance {
    fn want_out_of_jail(&self, state: &GameState, me: PlayerId) -> JailChoice {
        match self {
            PlayerInstance::Ai(p) => p.want_out_of_jail(state, me),
            PlayerInstance::Random(p) => p.want_out_of_jail(state, me),
            PlayerInstance::Scripted(p) => p.want_out_of_jail(state, me),
        }
    }

    fn will_buy(&self, state: &GameState, me: PlayerId, tile: TileId) -> bool {
        match self {
            PlayerInstance::Ai(p) => p.will_buy(state, me, tile),
            PlayerInstance::Random(p) => p.will_buy(state, me, tile),
            PlayerInstance::Scripted(p) => p.will_buy(state, me, tile),
        }
    }

    fn bid(&self, state: &GameState, me: PlayerId, auction: &Auction) -> Money {
        match self {
            PlayerInstance::Ai(p) => p.bid(state, me, auction),
            PlayerInstance::Random(p) => p.bid(state, me, auction),
            PlayerInstance::Scripted(p) => p.bid(state, me, auction),
        }
    }

    fn receive_trade_offer(&self, state: &GameState, me: PlayerId, offer: &TradeOffer) -> bool {
        match self {
            PlayerInstance::Ai(p) => p.receive_trade_offer(state, me, offer),
            PlayerInstance::Random(p) => p.receive_trade_offer(state, me, offer),
            PlayerInstance::Scripted(p) => p.receive_trade_offer(state, me, offer),
        }
    }

    fn make_money<P: BasePlayer>(
        &self,
        state: &mut GameState,
        players: &[P],
        me: PlayerId,
        shortfall: Money,
    ) -> Money {
        match self {
            PlayerInstance::Ai(p) => p.make_money(state, players, me, shortfall),
            PlayerInstance::Random(p) => p.make_money(state, players, me, shortfall),
            PlayerInstance::Scripted(p) => p.make_money(state, players, me, shortfall),
        }
    }

    fn end_turn<P: BasePlayer>(
        &self,
        state: &mut GameState,
        players: &[P],
        me: PlayerId,
    ) -> Result<(), GameError> {
        match self {
            PlayerInstance::Ai(p) => p.end_turn(state, players, me),
            PlayerInstance::Random(p) => p.end_turn(state, players, me),
            PlayerInstance::Scripted(p) => p.end_turn(state, players, me),
        }
    }
}

pub fn create_player(code: &str, params: Vec<&str>) -> Option<PlayerInstance> {
    match code.to_uppercase().as_str() {
        "A" => Some(PlayerInstance::Ai(AiPlayer)),
        "R" => Some(PlayerInstance::Random(RandomPlayer)),
        "S" => Some(PlayerInstance::Scripted(ScriptedPlayer {
            buy: params.iter().any(|p| p.eq_ignore_ascii_case("buy")),
            ..ScriptedPlayer::default()
        })),
        _ => None,
    }
}

pub fn print_player_help() {
    println!("Player Legend:");
    println!("{:<5} {:<25} {}", "CODE", "PLAYER", "DESCRIPTION");
    println!("{}", "-".repeat(80));
    for player in CLI_PLAYERS {
        println!("{:<5} {:<25} {}", player.code, player.name, player.description);
    }
}

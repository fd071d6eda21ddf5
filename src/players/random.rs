use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::board::tile_spec;
use crate::economy::auction::Auction;
use crate::game::GameState;
use crate::game::trade::{TradeOffer, cash_in};
use crate::players::BasePlayer;
use crate::types::{JailChoice, Money, PlayerId, TileId};

/// Answers every affordable question with a coin flip.
///
/// The coin is seeded from the game's random stream position, the log length, the seat
/// and the question, so a seeded game replays the same answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPlayer;

fn coin(state: &GameState, me: PlayerId, question: u64) -> StdRng {
    let (seed, draws) = state.rng_position();
    let mixed = seed
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(draws.rotate_left(17))
        .wrapping_add((state.log.len() as u64).rotate_left(34))
        .wrapping_add((me as u64).rotate_left(51))
        ^ question;
    StdRng::seed_from_u64(mixed)
}

impl BasePlayer for RandomPlayer {
    fn want_out_of_jail(&self, state: &GameState, me: PlayerId) -> JailChoice {
        let mut choices = vec![JailChoice::None];
        if state.players[me].jail_cards > 0 {
            choices.push(JailChoice::Card);
        }
        if state.cash(me) >= state.config.jail_fine {
            choices.push(JailChoice::Money);
        }
        choices
            .choose(&mut coin(state, me, 1))
            .copied()
            .unwrap_or_default()
    }

    fn will_buy(&self, state: &GameState, me: PlayerId, tile: TileId) -> bool {
        state.cash(me) >= tile_spec(tile).cost
            && coin(state, me, 2 ^ ((tile as u64) << 8)).gen_bool(0.5)
    }

    fn bid(&self, state: &GameState, me: PlayerId, auction: &Auction) -> Money {
        let bid = auction.min_valid_bid();
        let question = 3 ^ ((bid as u64) << 8);
        if bid <= state.cash(me) && coin(state, me, question).gen_bool(0.5) {
            bid
        } else {
            0
        }
    }

    fn receive_trade_offer(&self, state: &GameState, me: PlayerId, offer: &TradeOffer) -> bool {
        let given = cash_in(offer.given_by(me));
        let received = cash_in(offer.received_by(me));
        let question = 4 ^ ((given as u64) << 8) ^ ((received as u64) << 32);
        given <= state.cash(me) && coin(state, me, question).gen_bool(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, GameConfig};

    fn make_game(seed: u64) -> Game {
        Game::new(GameConfig {
            num_players: 3,
            seed,
            max_rounds: 40,
            ..GameConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn answers_depend_only_on_the_game() {
        let game = make_game(5);
        let answers: Vec<bool> = (0..40).map(|tile| RandomPlayer.will_buy(&game.state, 0, tile)).collect();
        let again: Vec<bool> = (0..40).map(|tile| RandomPlayer.will_buy(&game.state, 0, tile)).collect();
        assert_eq!(answers, again);
        assert!(answers.contains(&true));
    }

    #[test]
    fn seeded_games_with_random_seats_replay() {
        let players = vec![RandomPlayer; 3];
        let mut first = make_game(11);
        let mut second = make_game(11);
        first.play(&players).unwrap();
        second.play(&players).unwrap();
        assert_eq!(first.state.log, second.state.log);
        assert_eq!(first.state.round, second.state.round);
    }
}

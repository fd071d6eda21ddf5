use tracing::{debug, info};
use uuid::Uuid;

use crate::board::cards::{AdvanceTarget, Card, CardEffect};
use crate::board::{MAX_BUILDINGS, tile_spec};
use crate::economy::auction;
use crate::game::action::GameEvent;
use crate::game::{GameConfig, GameError, GameState};
use crate::players::BasePlayer;
use crate::types::{DeckKind, JailChoice, Money, PlayerId, TileId, TileKind};

/// Drives turns over a [`GameState`], asking the seated players for their decisions.
pub struct Game {
    pub id: Uuid,
    pub seed: u64,
    pub state: GameState,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let seed = config.seed;
        Ok(Self {
            id: Uuid::new_v4(),
            seed,
            state: GameState::new(config)?,
        })
    }

    /// Resumes from a snapshot.
    pub fn from_state(state: GameState) -> Self {
        Self {
            id: Uuid::new_v4(),
            seed: state.config.seed,
            state,
        }
    }

    /// Plays until one player is left or the round limit is reached.
    pub fn play<P: BasePlayer>(&mut self, players: &[P]) -> Result<Option<PlayerId>, GameError> {
        self.check_seats(players)?;
        while self.state.winner().is_none() && self.state.round < self.state.config.max_rounds {
            self.play_turn(players)?;
        }
        let winner = self.state.winner();
        info!(
            game = %self.id,
            ?winner,
            rounds = self.state.round,
            "game finished"
        );
        Ok(winner)
    }

    pub fn play_turn<P: BasePlayer>(&mut self, players: &[P]) -> Result<(), GameError> {
        self.play_turn_with_dice(players, &[])
    }

    /// Plays the current player's turn. Each roll of the turn (doubles roll again) takes
    /// the next pair of `dice`, falling back to the game's random stream.
    pub fn play_turn_with_dice<P: BasePlayer>(
        &mut self,
        players: &[P],
        dice: &[(u8, u8)],
    ) -> Result<(), GameError> {
        self.check_seats(players)?;
        if self.state.winner().is_some() {
            return Err(GameError::GameFinished);
        }
        let player = self.state.turn;
        self.state.ensure_active(player)?;
        self.state.doubles = 0;

        let mut injected = dice.iter().copied();
        loop {
            let roll = match injected.next() {
                Some(roll) => roll,
                None => self.state.roll_dice(),
            };
            if !self.take_roll(players, player, roll)? {
                break;
            }
        }
        self.next_player(players)
    }

    fn check_seats<P>(&self, players: &[P]) -> Result<(), GameError> {
        if players.len() != self.state.players.len() {
            return Err(GameError::SeatMismatch {
                expected: self.state.players.len(),
                actual: players.len(),
            });
        }
        Ok(())
    }

    /// Resolves one roll. Returns whether the player rolls again.
    fn take_roll<P: BasePlayer>(
        &mut self,
        players: &[P],
        player: PlayerId,
        (a, b): (u8, u8),
    ) -> Result<bool, GameError> {
        let state = &mut self.state;
        state.last_roll = Some((a, b));
        let doubles = a == b;
        let mut moving = true;

        if state.players[player].in_jail {
            state.players[player].jail_rolls += 1;
            let choice = players[player].want_out_of_jail(state, player);
            match choice {
                JailChoice::Card if state.players[player].jail_cards > 0 => {
                    state.players[player].jail_cards -= 1;
                    state.players[player].release_from_jail();
                    state.push_event(GameEvent::UseJailCard { player });
                    state.push_event(GameEvent::Roll { player, dice: (a, b) });
                }
                JailChoice::Money => {
                    state.players[player].release_from_jail();
                    state.push_event(GameEvent::PayJailFine { player });
                    let fine = state.config.jail_fine;
                    if !state.spend(players, player, fine, None)? {
                        return Ok(false);
                    }
                    state.push_event(GameEvent::Roll { player, dice: (a, b) });
                }
                _ => {
                    state.push_event(GameEvent::Roll { player, dice: (a, b) });
                    if doubles {
                        state.players[player].release_from_jail();
                        state.push_event(GameEvent::DoublesOutOfJail { player });
                    } else if state.players[player].jail_rolls >= 3 {
                        state.players[player].release_from_jail();
                        state.push_event(GameEvent::PayJailFine { player });
                        let fine = state.config.jail_fine;
                        if !state.spend(players, player, fine, None)? {
                            return Ok(false);
                        }
                    } else {
                        state.push_event(GameEvent::StayInJail { player });
                        moving = false;
                    }
                }
            }
        } else {
            state.push_event(GameEvent::Roll { player, dice: (a, b) });
        }

        if doubles {
            state.doubles += 1;
            if state.doubles == 3 {
                debug!(player, "third double");
                state.players[player].send_to_jail();
                state.push_event(GameEvent::ThreeDoublesToJail { player });
                return Ok(false);
            }
        }
        if !moving {
            return Ok(false);
        }

        if state.players[player].advance((a + b) as usize) {
            self.collect_go(player);
        }
        self.handle_tile(players, player)?;
        let state = &self.state;
        Ok(doubles && state.is_active(player) && !state.players[player].in_jail)
    }

    fn collect_go(&mut self, player: PlayerId) {
        let amount = self.state.config.go_money;
        let state = &mut self.state.players[player];
        state.cash += amount;
        let cash = state.cash;
        self.state.push_event(GameEvent::PassGo {
            player,
            amount,
            cash,
        });
    }

    fn handle_tile<P: BasePlayer>(&mut self, players: &[P], player: PlayerId) -> Result<(), GameError> {
        let tile = self.state.players[player].position;
        let cash = self.state.cash(player);
        self.state.push_event(GameEvent::Land { player, tile, cash });
        let spec = tile_spec(tile);

        match spec.kind {
            TileKind::Chance | TileKind::CommunityChest => {
                let deck = if spec.kind == TileKind::Chance {
                    DeckKind::Chance
                } else {
                    DeckKind::CommunityChest
                };
                if let Some(card) = self.state.draw_card(deck) {
                    self.handle_card(players, player, deck, card)?;
                }
            }
            TileKind::GoToJail => {
                self.state.players[player].send_to_jail();
                self.state.push_event(GameEvent::Jail { player });
            }
            TileKind::Tax => {
                self.state.spend(players, player, spec.cost, None)?;
            }
            kind if kind.is_ownable() => {
                let Some(asset) = self.state.board.asset(tile) else {
                    return Ok(());
                };
                let (owner, mortgaged) = (asset.owner, asset.mortgaged);
                match owner {
                    None => self.offer_title(players, player, tile)?,
                    Some(owner) if owner == player => {
                        if !mortgaged {
                            self.state.push_event(GameEvent::Owns { player, tile });
                        }
                    }
                    Some(owner) => {
                        let amount = self.state.rent_due(tile, player);
                        if amount > 0 {
                            self.state.push_event(GameEvent::Rent {
                                player,
                                owner,
                                tile,
                                amount,
                            });
                            self.state.spend(players, player, amount, Some(owner))?;
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// A declined or unaffordable purchase goes to auction.
    fn offer_title<P: BasePlayer>(
        &mut self,
        players: &[P],
        player: PlayerId,
        tile: TileId,
    ) -> Result<(), GameError> {
        let cost = tile_spec(tile).cost;
        if players[player].will_buy(&self.state, player, tile)
            && self.state.try_spend(players, player, cost, None)?
        {
            self.state.assign_title(tile, Some(player))?;
            return Ok(());
        }
        if self.state.config.auctions && self.state.board.owner(tile).is_none() {
            auction::run_auction(&mut self.state, players, tile)?;
        }
        Ok(())
    }

    fn handle_card<P: BasePlayer>(
        &mut self,
        players: &[P],
        player: PlayerId,
        deck: DeckKind,
        card: &'static Card,
    ) -> Result<(), GameError> {
        self.state.push_event(GameEvent::DrawCard {
            player,
            deck,
            card: card.id,
        });
        debug!(player, card = card.text, "card drawn");

        match card.effect {
            CardEffect::Advance(target) => {
                let position = self.state.players[player].position;
                let tile = match target {
                    AdvanceTarget::Tile(tile) => tile,
                    AdvanceTarget::Nearest(kind) => self.state.board.next_of_kind(position, kind),
                };
                if self.state.players[player].advance_to(tile) {
                    self.collect_go(player);
                }
                self.handle_tile(players, player)?;
            }
            CardEffect::Back(steps) => {
                self.state.players[player].move_back(steps as usize);
                self.handle_tile(players, player)?;
            }
            CardEffect::Earn(amount) => self.state.earn(player, amount)?,
            CardEffect::Spend(amount) => {
                self.state.spend(players, player, amount, None)?;
            }
            CardEffect::GoToJail => {
                self.state.players[player].send_to_jail();
                self.state.push_event(GameEvent::Jail { player });
            }
            CardEffect::JailCard => self.state.players[player].jail_cards += 1,
            CardEffect::EarnFromEachPlayer(amount) => {
                let payers: Vec<PlayerId> = self.state.opponents(player).map(|p| p.index).collect();
                for payer in payers {
                    if self.state.is_active(payer) {
                        self.state.spend(players, payer, amount, Some(player))?;
                    }
                }
            }
            CardEffect::PayEachPlayer(amount) => {
                let payees: Vec<PlayerId> = self.state.opponents(player).map(|p| p.index).collect();
                for payee in payees {
                    if !self.state.is_active(player) {
                        break;
                    }
                    if self.state.is_active(payee) {
                        self.state.spend(players, player, amount, Some(payee))?;
                    }
                }
            }
            CardEffect::Repairs { house, hotel } => {
                let amount: Money = self
                    .state
                    .board
                    .titles_of(player)
                    .map(|asset| match asset.buildings {
                        MAX_BUILDINGS => hotel,
                        houses => houses as Money * house,
                    })
                    .sum();
                if amount > 0 {
                    self.state.spend(players, player, amount, None)?;
                }
            }
        }
        Ok(())
    }

    /// Runs the end-of-turn hook, closes the turn in the log and moves to the next
    /// active seat.
    fn next_player<P: BasePlayer>(&mut self, players: &[P]) -> Result<(), GameError> {
        let current = self.state.turn;
        if self.state.is_active(current) {
            players[current].end_turn(&mut self.state, players, current)?;
        }
        self.state.log.end_turn();
        self.state.doubles = 0;
        if self.state.winner().is_some() {
            return Ok(());
        }
        let seats = self.state.players.len();
        loop {
            self.state.turn = (self.state.turn + 1) % seats;
            if self.state.turn == 0 {
                self.state.round += 1;
            }
            if self.state.is_active(self.state.turn) {
                return Ok(());
            }
        }
    }
}

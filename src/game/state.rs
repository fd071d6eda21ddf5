use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::cards::Card;
use crate::board::{Board, MAX_BUILDINGS, OwnableAsset, tile_spec};
use crate::economy::auction;
use crate::players::BasePlayer;
use crate::types::{ColorGroup, DeckKind, Money, PlayerId, TileId, TurnStamp, scale};

use super::{
    action::{ActionLog, GameEvent},
    bank::Bank,
    config::{ConfigError, GameConfig},
    players::PlayerState,
    rng::GameRng,
    trade::TradeError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub config: GameConfig,
    pub board: Board,
    pub players: Vec<PlayerState>,
    pub bank: Bank,
    pub round: u32,
    pub turn: PlayerId,
    pub doubles: u8,
    pub last_roll: Option<(u8, u8)>,
    pub log: ActionLog,
    rng: GameRng,
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("game already completed")]
    GameFinished,
    #[error("invalid player index {0}")]
    InvalidPlayer(PlayerId),
    #[error("player {0} has been eliminated")]
    PlayerEliminated(PlayerId),
    #[error("expected {expected} players, got {actual}")]
    SeatMismatch { expected: usize, actual: usize },
    #[error("tile {0} is not an ownable asset")]
    NotOwnable(TileId),
    #[error("tile {0} already has an owner")]
    AlreadyOwned(TileId),
    #[error("tile {0} is not a property")]
    NotProperty(TileId),
    #[error("tile {tile} is not owned by player {player}")]
    NotOwner { tile: TileId, player: PlayerId },
    #[error("tile {0} is already mortgaged")]
    AlreadyMortgaged(TileId),
    #[error("tile {0} is not mortgaged")]
    NotMortgaged(TileId),
    #[error("{group} is not wholly owned by player {player}")]
    IncompleteSet { group: ColorGroup, player: PlayerId },
    #[error("{0} contains a mortgaged property")]
    MortgagedInSet(ColorGroup),
    #[error("{0} has buildings")]
    BuildingsPresent(ColorGroup),
    #[error("changing buildings on tile {0} would break even building")]
    UnevenBuilding(TileId),
    #[error("tile {0} has no buildings")]
    NoBuildings(TileId),
    #[error("tile {0} already has a hotel")]
    BuildingLimit(TileId),
    #[error("player {player} needs {needed} but holds {available}")]
    InsufficientCash {
        player: PlayerId,
        needed: Money,
        available: Money,
    },
    #[error(transparent)]
    Trade(#[from] TradeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl GameState {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let mut rng = GameRng::new(config.seed);
        let bank = Bank::standard(&mut rng);
        let players = (0..config.num_players)
            .map(|index| PlayerState::new(index, config.starting_cash))
            .collect();
        Ok(Self {
            config,
            board: Board::standard(),
            players,
            bank,
            round: 0,
            turn: 0,
            doubles: 0,
            last_roll: None,
            log: ActionLog::default(),
            rng,
        })
    }

    // ---------------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------------

    pub fn player(&self, player: PlayerId) -> Result<&PlayerState, GameError> {
        self.players
            .get(player)
            .ok_or(GameError::InvalidPlayer(player))
    }

    pub fn is_active(&self, player: PlayerId) -> bool {
        self.players.get(player).is_some_and(PlayerState::is_active)
    }

    pub fn active_players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.iter().filter(|p| p.is_active())
    }

    pub fn opponents(&self, me: PlayerId) -> impl Iterator<Item = &PlayerState> {
        self.active_players().filter(move |p| p.index != me)
    }

    /// The last player standing, once everyone else is eliminated.
    pub fn winner(&self) -> Option<PlayerId> {
        let mut active = self.active_players();
        let first = active.next()?;
        active.next().is_none().then_some(first.index)
    }

    pub fn stamp(&self) -> TurnStamp {
        TurnStamp {
            round: self.round,
            turn: self.turn,
        }
    }

    pub fn cash(&self, player: PlayerId) -> Money {
        self.players.get(player).map_or(0, |p| p.cash)
    }

    /// Rent `payer` owes on `tile` given the last dice roll.
    pub fn rent_due(&self, tile: TileId, payer: PlayerId) -> Money {
        let roll = self.last_roll.map_or(7, |(a, b)| a + b);
        self.board.rent(tile, payer, roll)
    }

    /// Price of lifting the mortgage on `tile`; the late multiplier applies once more than a
    /// full round has passed since the title changed hands.
    pub fn unmortgage_price(&self, tile: TileId) -> Money {
        let Some(asset) = self.board.asset(tile) else {
            return 0;
        };
        let changed = asset.ownership_changed;
        let elapsed = self.round.saturating_sub(changed.round);
        let late = elapsed > 1 || (elapsed == 1 && self.turn > changed.turn);
        let multiplier = if late {
            self.config.late_unmortgage_multiplier
        } else {
            self.config.unmortgage_multiplier
        };
        scale(asset.spec().cost, multiplier / 2.0)
    }

    pub fn mortgage_value(&self, tile: TileId) -> Money {
        scale(tile_spec(tile).cost, self.config.mortgage_multiplier)
    }

    pub fn demolish_value(&self, tile: TileId) -> Money {
        scale(tile_spec(tile).building_cost, self.config.demolish_multiplier)
    }

    // ---------------------------------------------------------------------------------
    // Random stream and log
    // ---------------------------------------------------------------------------------

    pub fn roll_dice(&mut self) -> (u8, u8) {
        (self.rng.gen_range(1..=6), self.rng.gen_range(1..=6))
    }

    pub fn draw_card(&mut self, kind: DeckKind) -> Option<&'static Card> {
        self.bank.draw(kind, &mut self.rng)
    }

    pub fn rng_position(&self) -> (u64, u64) {
        (self.rng.seed(), self.rng.draws())
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.log.push(event);
    }

    // ---------------------------------------------------------------------------------
    // Cash
    // ---------------------------------------------------------------------------------

    pub fn earn(&mut self, player: PlayerId, amount: Money) -> Result<(), GameError> {
        self.ensure_active(player)?;
        let state = &mut self.players[player];
        state.cash += amount;
        let cash = state.cash;
        self.push_event(GameEvent::Earn {
            player,
            amount,
            cash,
        });
        Ok(())
    }

    /// Pays `amount` to `to` (the bank when `None`), liquidating holdings on a shortfall.
    /// A player who still cannot pay is eliminated in favour of the creditor and
    /// `Ok(false)` is returned.
    pub fn spend<P: BasePlayer>(
        &mut self,
        players: &[P],
        player: PlayerId,
        amount: Money,
        to: Option<PlayerId>,
    ) -> Result<bool, GameError> {
        if self.settle(players, player, amount, to)? {
            return Ok(true);
        }
        self.eliminate(players, player, to)?;
        Ok(false)
    }

    /// Like [`GameState::spend`] but leaves the player in the game when the money cannot
    /// be raised.
    pub fn try_spend<P: BasePlayer>(
        &mut self,
        players: &[P],
        player: PlayerId,
        amount: Money,
        to: Option<PlayerId>,
    ) -> Result<bool, GameError> {
        self.settle(players, player, amount, to)
    }

    fn settle<P: BasePlayer>(
        &mut self,
        players: &[P],
        player: PlayerId,
        amount: Money,
        to: Option<PlayerId>,
    ) -> Result<bool, GameError> {
        self.ensure_active(player)?;
        if let Some(creditor) = to {
            self.ensure_active(creditor)?;
        }
        if amount <= 0 {
            return Ok(true);
        }
        let cash = self.players[player].cash;
        if cash < amount {
            let agent = players.get(player).ok_or(GameError::InvalidPlayer(player))?;
            let shortfall = amount - cash;
            debug!(player, amount, shortfall, "raising funds");
            let remaining = agent.make_money(self, players, player, shortfall);
            if remaining > 0 || self.players[player].cash < amount {
                debug!(player, remaining, "could not raise funds");
                return Ok(false);
            }
        }
        self.transfer_cash(player, amount, to);
        Ok(true)
    }

    /// Moves cash that is known to be available and logs it.
    pub(crate) fn transfer_cash(&mut self, player: PlayerId, amount: Money, to: Option<PlayerId>) {
        self.players[player].cash -= amount;
        let cash = self.players[player].cash;
        match to {
            Some(to) => {
                self.players[to].cash += amount;
                let to_cash = self.players[to].cash;
                self.push_event(GameEvent::Pay {
                    player,
                    to,
                    amount,
                    cash,
                    to_cash,
                });
            }
            None => self.push_event(GameEvent::Spend {
                player,
                amount,
                cash,
            }),
        }
    }

    // ---------------------------------------------------------------------------------
    // Titles
    // ---------------------------------------------------------------------------------

    /// Hands a title to `owner` (or back to the bank), stamping the change.
    pub fn assign_title(&mut self, tile: TileId, owner: Option<PlayerId>) -> Result<(), GameError> {
        if let Some(player) = owner {
            self.ensure_active(player)?;
        }
        let stamp = self.stamp();
        let asset = self
            .board
            .asset_mut(tile)
            .ok_or(GameError::NotOwnable(tile))?;
        asset.owner = owner;
        asset.ownership_changed = stamp;
        if owner.is_none() {
            asset.mortgaged = false;
            asset.buildings = 0;
        }
        if let Some(player) = owner {
            self.push_event(GameEvent::ReceiveTitle { player, tile });
        }
        Ok(())
    }

    fn owned_asset(&self, player: PlayerId, tile: TileId) -> Result<&OwnableAsset, GameError> {
        self.ensure_active(player)?;
        let asset = self.board.asset(tile).ok_or(GameError::NotOwnable(tile))?;
        if asset.owner != Some(player) {
            return Err(GameError::NotOwner { tile, player });
        }
        Ok(asset)
    }

    pub fn mortgage(&mut self, player: PlayerId, tile: TileId) -> Result<Money, GameError> {
        let asset = self.owned_asset(player, tile)?;
        if asset.mortgaged {
            return Err(GameError::AlreadyMortgaged(tile));
        }
        if let Some(group) = asset.spec().group {
            if self.board.group_has_buildings(group) {
                return Err(GameError::BuildingsPresent(group));
            }
        }
        let amount = self.mortgage_value(tile);
        if let Some(asset) = self.board.asset_mut(tile) {
            asset.mortgaged = true;
        }
        self.players[player].cash += amount;
        let cash = self.players[player].cash;
        debug!(player, tile, amount, "mortgaged");
        self.push_event(GameEvent::Mortgage {
            player,
            tile,
            amount,
            cash,
        });
        Ok(amount)
    }

    pub fn unmortgage(&mut self, player: PlayerId, tile: TileId) -> Result<Money, GameError> {
        let asset = self.owned_asset(player, tile)?;
        if !asset.mortgaged {
            return Err(GameError::NotMortgaged(tile));
        }
        let amount = self.unmortgage_price(tile);
        let available = self.players[player].cash;
        if available < amount {
            return Err(GameError::InsufficientCash {
                player,
                needed: amount,
                available,
            });
        }
        if let Some(asset) = self.board.asset_mut(tile) {
            asset.mortgaged = false;
        }
        self.players[player].cash -= amount;
        let cash = self.players[player].cash;
        self.push_event(GameEvent::Unmortgage {
            player,
            tile,
            amount,
            cash,
        });
        Ok(amount)
    }

    /// Adds one building to `tile`, keeping the group evenly built.
    pub fn build(&mut self, player: PlayerId, tile: TileId) -> Result<(), GameError> {
        let asset = self.owned_asset(player, tile)?;
        let spec = asset.spec();
        let group = spec.group.ok_or(GameError::NotProperty(tile))?;
        if !self.board.owns_group(player, group) {
            return Err(GameError::IncompleteSet { group, player });
        }
        if self.board.group_has_mortgage(group) {
            return Err(GameError::MortgagedInSet(group));
        }
        if asset.buildings >= MAX_BUILDINGS {
            return Err(GameError::BuildingLimit(tile));
        }
        let (min, _) = self.board.group_building_range(group);
        if asset.buildings > min {
            return Err(GameError::UnevenBuilding(tile));
        }
        let cost = spec.building_cost;
        let available = self.players[player].cash;
        if available < cost {
            return Err(GameError::InsufficientCash {
                player,
                needed: cost,
                available,
            });
        }

        let buildings = match self.board.asset_mut(tile) {
            Some(asset) => {
                asset.buildings += 1;
                asset.buildings
            }
            None => return Err(GameError::NotOwnable(tile)),
        };
        self.players[player].cash -= cost;
        let cash = self.players[player].cash;
        self.push_event(GameEvent::Build {
            player,
            tile,
            buildings,
            cash,
        });
        Ok(())
    }

    /// Sells one building from `tile` back to the bank.
    pub fn demolish(&mut self, player: PlayerId, tile: TileId) -> Result<Money, GameError> {
        let asset = self.owned_asset(player, tile)?;
        let group = asset.spec().group.ok_or(GameError::NotProperty(tile))?;
        if asset.buildings == 0 {
            return Err(GameError::NoBuildings(tile));
        }
        let (_, max) = self.board.group_building_range(group);
        if asset.buildings < max {
            return Err(GameError::UnevenBuilding(tile));
        }

        let amount = self.demolish_value(tile);
        let buildings = match self.board.asset_mut(tile) {
            Some(asset) => {
                asset.buildings -= 1;
                asset.buildings
            }
            None => return Err(GameError::NotOwnable(tile)),
        };
        self.players[player].cash += amount;
        let cash = self.players[player].cash;
        self.push_event(GameEvent::Demolish {
            player,
            tile,
            buildings,
            amount,
            cash,
        });
        Ok(amount)
    }

    // ---------------------------------------------------------------------------------
    // Elimination
    // ---------------------------------------------------------------------------------

    /// Removes `player` from the game. Cash, jail cards and titles go to `creditor`; with
    /// no creditor the titles return to the bank and are auctioned.
    pub fn eliminate<P: BasePlayer>(
        &mut self,
        players: &[P],
        player: PlayerId,
        creditor: Option<PlayerId>,
    ) -> Result<(), GameError> {
        self.ensure_active(player)?;
        let creditor = creditor.filter(|c| *c != player && self.is_active(*c));
        info!(player, ?creditor, round = self.round, "player bankrupt");
        self.push_event(GameEvent::Bankrupt { player, creditor });

        let titles: Vec<TileId> = self.board.titles_of(player).map(|a| a.tile).collect();
        let state = &mut self.players[player];
        let cash = std::mem::take(&mut state.cash);
        let jail_cards = std::mem::take(&mut state.jail_cards);
        state.eliminated = true;
        state.in_jail = false;

        for tile in &titles {
            if let Some(asset) = self.board.asset_mut(*tile) {
                asset.buildings = 0;
            }
        }

        match creditor {
            Some(to) => {
                self.players[to].jail_cards += jail_cards;
                if cash > 0 {
                    self.earn(to, cash)?;
                }
                for tile in titles {
                    self.assign_title(tile, Some(to))?;
                }
            }
            None => {
                for tile in titles {
                    self.assign_title(tile, None)?;
                    if self.config.auctions && self.active_players().count() > 0 {
                        auction::run_auction(self, players, tile)?;
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn ensure_active(&self, player: PlayerId) -> Result<(), GameError> {
        match self.players.get(player) {
            None => Err(GameError::InvalidPlayer(player)),
            Some(p) if p.eliminated => Err(GameError::PlayerEliminated(player)),
            Some(_) => Ok(()),
        }
    }

    // ---------------------------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------------------------

    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let state: GameState = serde_json::from_str(json)?;
        state.config.validate()?;
        Ok(state)
    }
}

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::debug;

use crate::board::{BOARD_SIZE, MAX_BUILDINGS, group_members, tile_spec};
use crate::economy::auction::{Auction, suggested_bid};
use crate::economy::negotiation::{self, holds_sets, near_sets, try_acquire};
use crate::economy::valuation::{max_money, usable_money};
use crate::game::trade::TradeOffer;
use crate::game::{GameError, GameState};
use crate::players::BasePlayer;
use crate::types::{ColorGroup, JailChoice, Money, PlayerId, TileId, TileKind};

/// Heuristic agent built on the valuation, liquidation and negotiation engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct AiPlayer;

/// How many of the 36 two-dice outcomes land each opponent on each tile.
pub fn landing_frequency(state: &GameState, me: PlayerId) -> [u32; BOARD_SIZE] {
    let mut freq = [0; BOARD_SIZE];
    for opponent in state.opponents(me) {
        for a in 1..=6 {
            for b in 1..=6 {
                freq[(opponent.position + a + b) % BOARD_SIZE] += 1;
            }
        }
    }
    freq
}

/// Mean buildings per tile across the groups `player` holds outright.
fn built_average(state: &GameState, player: PlayerId) -> f64 {
    let groups = state.board.completed_groups(player);
    let tiles: Vec<&TileId> = groups.iter().flat_map(|g| group_members(*g)).collect();
    if tiles.is_empty() {
        return 0.0;
    }
    let buildings: u32 = tiles
        .iter()
        .filter_map(|tile| state.board.asset(**tile))
        .map(|asset| asset.buildings as u32)
        .sum();
    buildings as f64 / tiles.len() as f64
}

impl AiPlayer {
    fn trade_for_near_sets<P: BasePlayer>(
        &self,
        state: &mut GameState,
        players: &[P],
        me: PlayerId,
    ) -> Result<(), GameError> {
        let wanted = near_sets(state, me);
        if wanted.is_empty() {
            return Ok(());
        }
        let holders = state
            .active_players()
            .filter(|p| holds_sets(state, p.index))
            .count();
        let active = state.active_players().count();
        let i_hold = holds_sets(state, me);
        let others_ahead = !i_hold && holders > 0;
        let well_built = !i_hold || built_average(state, me) > 3.0;
        if !(well_built && (holders == 0 || others_ahead || holders == active)) {
            return Ok(());
        }
        let policy = state.config.policy.clone();
        for tile in wanted {
            try_acquire(state, players, me, tile, &policy)?;
        }
        Ok(())
    }

    /// Builds evenly on complete groups, busiest groups first, lifting mortgages in a
    /// group before building on it.
    fn build_houses(&self, state: &mut GameState, me: PlayerId) -> Result<(), GameError> {
        let freq = landing_frequency(state, me);
        let mut usable = usable_money(state, me, false, true);
        let mut groups: Vec<(ColorGroup, u32)> = state
            .board
            .completed_groups(me)
            .into_iter()
            .map(|group| {
                let traffic = group_members(group).iter().map(|t| freq[*t]).sum();
                (group, traffic)
            })
            .collect();
        groups.sort_by_key(|(_, traffic)| Reverse(*traffic));

        'groups: for (group, traffic) in groups {
            if usable < 0 || traffic == 0 {
                break;
            }
            for &tile in group_members(group) {
                if state.board.asset(tile).is_some_and(|a| a.mortgaged) {
                    let price = state.unmortgage_price(tile);
                    if state.cash(me) < price {
                        continue 'groups;
                    }
                    state.unmortgage(me, tile)?;
                    usable -= price;
                }
            }
            let cost = group_members(group)
                .first()
                .map_or(0, |tile| tile_spec(*tile).building_cost);
            while usable > cost {
                let target = group_members(group)
                    .iter()
                    .filter_map(|tile| state.board.asset(*tile))
                    .filter(|asset| asset.buildings < MAX_BUILDINGS)
                    .min_by_key(|asset| (asset.buildings, Reverse(freq[asset.tile])))
                    .map(|asset| asset.tile);
                let Some(tile) = target else {
                    break;
                };
                if state.build(me, tile).is_err() {
                    break;
                }
                usable -= cost;
            }
        }
        Ok(())
    }

    fn lift_mortgages(&self, state: &mut GameState, me: PlayerId) -> Result<(), GameError> {
        let freq = landing_frequency(state, me);
        let mut usable = usable_money(state, me, true, true);
        let mut tiles: Vec<TileId> = state
            .board
            .titles_of(me)
            .filter(|asset| asset.mortgaged && freq[asset.tile] > 0)
            .map(|asset| asset.tile)
            .collect();
        tiles.sort_by_key(|tile| (Reverse(freq[*tile]), *tile));
        for tile in tiles {
            let price = state.unmortgage_price(tile);
            if usable > price && state.cash(me) >= price {
                state.unmortgage(me, tile)?;
                usable -= price;
            }
        }
        Ok(())
    }

    /// With money to spare and developed sets, reaches into groups still two or more
    /// tiles away from completion.
    fn expand<P: BasePlayer>(
        &self,
        state: &mut GameState,
        players: &[P],
        me: PlayerId,
    ) -> Result<(), GameError> {
        if usable_money(state, me, true, true) <= 0 || built_average(state, me) < 4.0 {
            return Ok(());
        }
        let policy = state.config.policy.clone();
        for group in ColorGroup::ALL {
            let members = group_members(group);
            let mine = members
                .iter()
                .filter(|t| state.board.owner(**t) == Some(me))
                .count();
            if mine == 0 || members.len() - mine < 2 {
                continue;
            }
            for &tile in members {
                let Some(owner) = state.board.owner(tile) else {
                    continue;
                };
                if owner == me || !state.is_active(owner) {
                    continue;
                }
                if try_acquire(state, players, me, tile, &policy)?
                    && usable_money(state, me, true, true) < 0
                {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

impl BasePlayer for AiPlayer {
    fn want_out_of_jail(&self, state: &GameState, me: PlayerId) -> JailChoice {
        if usable_money(state, me, true, false) < 50 {
            JailChoice::None
        } else if state.players[me].jail_cards > 0 {
            JailChoice::Card
        } else {
            JailChoice::Money
        }
    }

    fn will_buy(&self, state: &GameState, me: PlayerId, tile: TileId) -> bool {
        let spec = tile_spec(tile);
        let cost = spec.cost as f64;
        let richest = state.opponents(me).map(|p| p.cash).max().unwrap_or(0);
        if (richest as f64) < cost * 0.8 {
            return false;
        }
        if let (TileKind::Property, Some(group)) = (spec.kind, spec.group) {
            let members = group_members(group);
            let mut holders: HashMap<PlayerId, usize> = HashMap::new();
            for owner in members.iter().filter_map(|member| state.board.owner(*member)) {
                *holders.entry(owner).or_default() += 1;
            }
            let most = holders.values().copied().max().unwrap_or(0);
            if (max_money(state, me) as f64) / 2.0 < cost * 1.2 {
                return false;
            }
            if members.len() - most == 1 {
                return true;
            }
        }
        state.cash(me) > spec.cost
    }

    fn bid(&self, state: &GameState, me: PlayerId, auction: &Auction) -> Money {
        suggested_bid(state, me, auction)
    }

    fn receive_trade_offer(&self, state: &GameState, me: PlayerId, offer: &TradeOffer) -> bool {
        negotiation::evaluate(state, me, offer)
    }

    fn end_turn<P: BasePlayer>(
        &self,
        state: &mut GameState,
        players: &[P],
        me: PlayerId,
    ) -> Result<(), GameError> {
        if !state.is_active(me) {
            return Ok(());
        }
        self.trade_for_near_sets(state, players, me)?;
        self.build_houses(state, me)?;
        self.lift_mortgages(state, me)?;
        self.expand(state, players, me)?;
        debug!(player = me, cash = state.cash(me), "ai turn finished");
        Ok(())
    }
}

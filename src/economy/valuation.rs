//! Pricing of holdings. Every other economic component asks this module what a bundle of
//! titles, cash and jail cards is worth to a given player.

use std::collections::BTreeMap;

use crate::board::{BOARD_SIZE, group_members, tile_spec};
use crate::game::GameState;
use crate::game::trade::{TradeOffer, cash_in, jail_cards_in, tiles_in};
use crate::types::{ColorGroup, Money, PlayerId, TileId, TileKind};

/// Flat value of the chance and community chest squares when sizing a reserve.
const CARD_SQUARE_EXPOSURE: Money = 50;
/// Dice total assumed when estimating utility rent.
const EXPECTED_ROLL: u8 = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    pub tiles: Vec<TileId>,
    pub cash: Money,
    pub jail_cards: u32,
}

impl Bundle {
    pub fn holdings_of(state: &GameState, player: PlayerId) -> Self {
        let (cash, jail_cards) = state
            .players
            .get(player)
            .map_or((0, 0), |p| (p.cash, p.jail_cards));
        Self {
            tiles: state.board.titles_of(player).map(|a| a.tile).collect(),
            cash,
            jail_cards,
        }
    }

    /// Holdings of `player` once `offer` has gone through.
    pub fn after_trade(state: &GameState, player: PlayerId, offer: &TradeOffer) -> Self {
        let mut bundle = Self::holdings_of(state, player);
        let given = offer.given_by(player);
        let received = offer.received_by(player);
        bundle.tiles.retain(|tile| !tiles_in(given).any(|t| t == *tile));
        bundle.tiles.extend(tiles_in(received));
        bundle.cash += cash_in(received) - cash_in(given);
        bundle.jail_cards = (bundle.jail_cards + jail_cards_in(received))
            .saturating_sub(jail_cards_in(given));
        bundle
    }
}

/// Value of `bundle` to `perspective`, floored to whole money.
pub fn value(state: &GameState, bundle: &Bundle, perspective: PlayerId) -> Money {
    let config = &state.config;
    let board = &state.board;
    let mortgage_factor = config.mortgage_multiplier / config.late_unmortgage_multiplier;
    let utilities = board.count_owned(perspective, TileKind::Utility);
    let railroads = board.count_owned(perspective, TileKind::Railroad);

    let mut total = bundle.cash as f64 + (bundle.jail_cards as Money * config.jail_card_value) as f64;
    let mut groups: BTreeMap<ColorGroup, Vec<TileId>> = BTreeMap::new();

    for &tile in &bundle.tiles {
        let Some(asset) = board.asset(tile) else {
            continue;
        };
        let spec = asset.spec();
        let factor = if asset.mortgaged { mortgage_factor } else { 1.0 };
        match (spec.kind, spec.group) {
            (TileKind::Utility, _) => {
                let multiplier = if utilities < 2 { 1.0 } else { 1.5 };
                total += spec.cost as f64 * multiplier * factor;
            }
            (TileKind::Railroad, _) => {
                let multiplier = 2f64.powf((railroads as f64 - 1.0) / 5.0);
                total += spec.cost as f64 * multiplier * factor;
            }
            (TileKind::Property, Some(group)) => groups.entry(group).or_default().push(tile),
            _ => {}
        }
    }

    for (group, tiles) in groups {
        let multiplier = if tiles.len() == group_members(group).len() {
            3.0
        } else if tiles.len() == 1 {
            1.0
        } else {
            1.6
        };
        for tile in tiles {
            let Some(asset) = board.asset(tile) else {
                continue;
            };
            let spec = asset.spec();
            let factor = if asset.mortgaged { mortgage_factor } else { 1.0 };
            total += spec.cost as f64 * multiplier * factor;
            total += (spec.building_cost * asset.buildings as Money) as f64;
        }
    }

    total.floor() as Money
}

pub fn net_worth(state: &GameState, player: PlayerId) -> Money {
    value(state, &Bundle::holdings_of(state, player), player)
}

/// Cash a player would want to keep back against rent, taxes and cards on the next
/// landings, already divided by the policy's risk divisor.
pub fn reserve(state: &GameState, player: PlayerId, count_unowned: bool) -> Money {
    let needed: Money = (0..BOARD_SIZE)
        .map(|tile| match tile_spec(tile).kind {
            TileKind::Chance | TileKind::CommunityChest => CARD_SQUARE_EXPOSURE,
            TileKind::Tax => tile_spec(tile).cost,
            kind if kind.is_ownable() => {
                state
                    .board
                    .rent_exposure(tile, player, EXPECTED_ROLL, count_unowned)
            }
            _ => 0,
        })
        .sum();
    (needed as f64 / state.config.policy.risk).round() as Money
}

/// Cash above the reserve; `double` doubles the reserve.
pub fn usable_money(state: &GameState, player: PlayerId, double: bool, count_unowned: bool) -> Money {
    let reserve = reserve(state, player, count_unowned);
    let reserve = if double { reserve * 2 } else { reserve };
    state.cash(player) - reserve
}

/// Everything a player could raise from the bank alone: cash, mortgage value of
/// unmortgaged titles and the demolition value of buildings.
pub fn max_money(state: &GameState, player: PlayerId) -> Money {
    let titles: Money = state
        .board
        .titles_of(player)
        .map(|asset| {
            let buildings = state.demolish_value(asset.tile) * asset.buildings as Money;
            let mortgage = if asset.mortgaged {
                0
            } else {
                state.mortgage_value(asset.tile)
            };
            buildings + mortgage
        })
        .sum();
    state.cash(player) + titles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, TradeItem};

    fn make_state() -> GameState {
        GameState::new(GameConfig {
            num_players: 3,
            ..GameConfig::default()
        })
        .unwrap()
    }

    fn bundle(tiles: &[TileId], cash: Money) -> Bundle {
        Bundle {
            tiles: tiles.to_vec(),
            cash,
            jail_cards: 0,
        }
    }

    #[test]
    fn more_cash_is_worth_more() {
        let state = make_state();
        let poorer = value(&state, &bundle(&[1, 5], 100), 0);
        let richer = value(&state, &bundle(&[1, 5], 101), 0);
        assert!(richer > poorer);
    }

    #[test]
    fn completing_a_group_carries_a_premium() {
        let state = make_state();
        assert_eq!(value(&state, &bundle(&[37], 0), 0), 350);
        assert_eq!(value(&state, &bundle(&[37, 39], 0), 0), 2250);
        assert_eq!(value(&state, &bundle(&[16, 18], 0), 0), 576);
        let partial = value(&state, &bundle(&[16, 18], 0), 0) - value(&state, &bundle(&[16], 0), 0);
        let completing =
            value(&state, &bundle(&[16, 18, 19], 0), 0) - value(&state, &bundle(&[16, 18], 0), 0);
        assert!(completing > partial);
    }

    #[test]
    fn mortgages_discount_and_buildings_add() {
        let mut state = make_state();
        state.assign_title(37, Some(0)).unwrap();
        state.assign_title(39, Some(0)).unwrap();
        let clean = net_worth(&state, 0);
        state.build(0, 39).unwrap();
        assert_eq!(net_worth(&state, 0), clean);
        state.demolish(0, 39).unwrap();
        state.mortgage(0, 37).unwrap();
        let mortgaged = net_worth(&state, 0);
        // Cash 1575, Boardwalk 1200, Park Place 1050 discounted by 0.5 / 1.2.
        assert_eq!(mortgaged, 3212);
    }

    #[test]
    fn transport_depends_on_perspective_holdings() {
        let mut state = make_state();
        assert_eq!(value(&state, &bundle(&[12], 0), 0), 150);
        state.assign_title(12, Some(0)).unwrap();
        state.assign_title(28, Some(0)).unwrap();
        assert_eq!(value(&state, &bundle(&[12], 0), 0), 225);
        assert_eq!(value(&state, &bundle(&[5], 0), 1), 174);
        state.assign_title(5, Some(1)).unwrap();
        assert_eq!(value(&state, &bundle(&[5], 0), 1), 200);
    }

    #[test]
    fn post_trade_bundle_applies_both_sides() {
        let mut state = make_state();
        state.assign_title(1, Some(0)).unwrap();
        state.assign_title(3, Some(1)).unwrap();
        let offer = TradeOffer::new(0, 1, [TradeItem::Cash(120)], [TradeItem::Tile(3)]);
        let mine = Bundle::after_trade(&state, 0, &offer);
        assert_eq!(mine.cash, 1380);
        assert_eq!(mine.tiles, vec![1, 3]);
        let theirs = Bundle::after_trade(&state, 1, &offer);
        assert_eq!(theirs.cash, 1620);
        assert!(theirs.tiles.is_empty());
    }

    #[test]
    fn reserve_and_liquid_worth() {
        let mut state = make_state();
        // Taxes 300, six card squares 300, divided by a risk of 5.
        assert_eq!(reserve(&state, 0, false), 120);
        assert_eq!(usable_money(&state, 0, true, false), 1500 - 240);
        state.assign_title(39, Some(0)).unwrap();
        state.assign_title(37, Some(0)).unwrap();
        state.build(0, 39).unwrap();
        assert_eq!(max_money(&state, 0), 1300 + 100 + 200 + 175);
    }
}

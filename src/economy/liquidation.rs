//! Raising cash under distress.
//!
//! A plan is built greedily against a trial copy of the player's holdings, walking the
//! policy's liquidation classes in order. Mortgages and demolitions always go through;
//! market sales can be declined by every buyer, in which case the asset is excluded and the
//! plan is rebuilt from the current state.

use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::group_members;
use crate::economy::negotiation;
use crate::game::config::{LiquidationClass, PolicyConfig};
use crate::game::trade::{TradeItem, TradeOffer};
use crate::game::{GameError, GameState};
use crate::players::BasePlayer;
use crate::types::{ColorGroup, Money, PlayerId, TileId, TileKind, scale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiquidationAction {
    SellJailCard,
    Mortgage(TileId),
    Demolish(TileId),
    SellTitle(TileId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedStep {
    pub class: LiquidationClass,
    pub action: LiquidationAction,
    pub estimate: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiquidationPlan {
    pub steps: Vec<PlannedStep>,
    /// Part of the shortfall the plan cannot cover even on paper.
    pub uncovered: Money,
}

#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    pub titles: HashSet<TileId>,
    pub jail_cards: bool,
}

#[derive(Debug, Clone)]
struct TrialAsset {
    tile: TileId,
    kind: TileKind,
    group: Option<ColorGroup>,
    cost: Money,
    mortgaged: bool,
    buildings: u8,
    unusable: bool,
    sold: bool,
}

/// Holdings as they would look after the steps planned so far.
#[derive(Debug, Clone)]
struct Trial<'a> {
    assets: Vec<TrialAsset>,
    jail_cards: u32,
    exclusions: &'a Exclusions,
}

impl<'a> Trial<'a> {
    fn new(state: &GameState, player: PlayerId, exclusions: &'a Exclusions) -> Self {
        let mut assets: Vec<TrialAsset> = state
            .board
            .titles_of(player)
            .map(|asset| {
                let spec = asset.spec();
                TrialAsset {
                    tile: asset.tile,
                    kind: spec.kind,
                    group: spec.group,
                    cost: spec.cost,
                    mortgaged: asset.mortgaged,
                    buildings: asset.buildings,
                    unusable: false,
                    sold: false,
                }
            })
            .collect();

        // A pending purchase counts toward set completion but can never be liquidated.
        if let Some(position) = state.players.get(player).map(|p| p.position) {
            if let Some(asset) = state.board.asset(position).filter(|a| a.owner.is_none()) {
                let spec = asset.spec();
                if spec.kind == TileKind::Property {
                    assets.push(TrialAsset {
                        tile: position,
                        kind: spec.kind,
                        group: spec.group,
                        cost: spec.cost,
                        mortgaged: false,
                        buildings: 0,
                        unusable: true,
                        sold: false,
                    });
                }
            }
        }

        Self {
            assets,
            jail_cards: state.players.get(player).map_or(0, |p| p.jail_cards),
            exclusions,
        }
    }

    fn held(&self) -> impl Iterator<Item = &TrialAsset> {
        self.assets.iter().filter(|a| !a.sold)
    }

    fn completes_group(&self, group: ColorGroup) -> bool {
        self.held().filter(|a| a.group == Some(group)).count() == group_members(group).len()
    }

    fn group_has_buildings(&self, group: ColorGroup) -> bool {
        self.held()
            .any(|a| a.group == Some(group) && a.buildings > 0)
    }

    fn in_complete_group(&self, asset: &TrialAsset) -> bool {
        asset.group.is_some_and(|group| self.completes_group(group))
    }

    fn clear_group(&self, asset: &TrialAsset) -> bool {
        asset
            .group
            .is_none_or(|group| !self.group_has_buildings(group))
    }

    fn sellable(&self, asset: &TrialAsset) -> bool {
        !asset.unusable && !self.exclusions.titles.contains(&asset.tile)
    }

    fn find(&self, mut pred: impl FnMut(&TrialAsset) -> bool) -> Option<&TrialAsset> {
        self.held().find(|a| !a.unusable && pred(*a))
    }

    /// Next target of `class` with its estimated proceeds.
    fn pick(&self, state: &GameState, class: LiquidationClass) -> Option<(LiquidationAction, Money)> {
        use LiquidationClass::*;
        let config = &state.config;
        let mortgage = |a: &TrialAsset| {
            (
                LiquidationAction::Mortgage(a.tile),
                scale(a.cost, config.mortgage_multiplier),
            )
        };
        let sell = |a: &TrialAsset| {
            let estimate = if a.mortgaged {
                scale(a.cost, config.mortgage_multiplier)
            } else {
                a.cost
            };
            (LiquidationAction::SellTitle(a.tile), estimate)
        };

        match class {
            SellJailCard => (self.jail_cards > 0 && !self.exclusions.jail_cards)
                .then_some((LiquidationAction::SellJailCard, config.jail_card_value)),
            MortgageNonSetProperty => self
                .find(|a| a.kind == TileKind::Property && !a.mortgaged && !self.in_complete_group(a))
                .map(mortgage),
            MortgageUtility => self
                .find(|a| a.kind == TileKind::Utility && !a.mortgaged)
                .map(mortgage),
            MortgageRailroad => self
                .find(|a| a.kind == TileKind::Railroad && !a.mortgaged)
                .map(mortgage),
            MortgageSetProperty => self
                .find(|a| {
                    a.kind == TileKind::Property
                        && !a.mortgaged
                        && self.in_complete_group(a)
                        && self.clear_group(a)
                })
                .map(mortgage),
            SellUtility => self
                .find(|a| a.kind == TileKind::Utility && self.sellable(a))
                .map(sell),
            SellRailroad => self
                .find(|a| a.kind == TileKind::Railroad && self.sellable(a))
                .map(sell),
            SellNonSetProperty => self
                .find(|a| {
                    a.kind == TileKind::Property && !self.in_complete_group(a) && self.sellable(a)
                })
                .map(sell),
            SellSetProperty => self
                .find(|a| {
                    a.kind == TileKind::Property
                        && self.in_complete_group(a)
                        && self.clear_group(a)
                        && self.sellable(a)
                })
                .map(sell),
            SellBuilding => {
                // Demolish from the most built tile so the group stays even.
                let target = self
                    .held()
                    .filter(|a| a.buildings > 0 && !a.unusable)
                    .max_by_key(|a| (a.buildings, std::cmp::Reverse(a.tile)))?;
                Some((
                    LiquidationAction::Demolish(target.tile),
                    state.demolish_value(target.tile),
                ))
            }
        }
    }

    fn apply(&mut self, action: LiquidationAction) {
        match action {
            LiquidationAction::SellJailCard => self.jail_cards -= 1,
            LiquidationAction::Mortgage(tile) => {
                if let Some(asset) = self.asset_mut(tile) {
                    asset.mortgaged = true;
                }
            }
            LiquidationAction::Demolish(tile) => {
                if let Some(asset) = self.asset_mut(tile) {
                    asset.buildings -= 1;
                }
            }
            LiquidationAction::SellTitle(tile) => {
                if let Some(asset) = self.asset_mut(tile) {
                    asset.sold = true;
                }
            }
        }
    }

    fn asset_mut(&mut self, tile: TileId) -> Option<&mut TrialAsset> {
        self.assets.iter_mut().find(|a| a.tile == tile && !a.sold)
    }
}

/// Plans how `player` would cover `shortfall` without touching the game state.
pub fn plan(
    state: &GameState,
    player: PlayerId,
    shortfall: Money,
    policy: &PolicyConfig,
    exclusions: &Exclusions,
) -> LiquidationPlan {
    let mut trial = Trial::new(state, player, exclusions);
    let mut remaining = shortfall;
    let mut steps = Vec::new();

    for &class in &policy.liquidation_order {
        while remaining > 0 {
            let Some((action, estimate)) = trial.pick(state, class) else {
                break;
            };
            trial.apply(action);
            steps.push(PlannedStep {
                class,
                action,
                estimate,
            });
            remaining -= estimate;
        }
        if remaining <= 0 {
            break;
        }
    }

    LiquidationPlan {
        steps,
        uncovered: remaining.max(0),
    }
}

/// Raises at least `shortfall` in cash for `player`. Returns what is still missing, zero
/// when the shortfall was covered.
pub fn raise<P: BasePlayer>(
    state: &mut GameState,
    players: &[P],
    player: PlayerId,
    shortfall: Money,
    policy: &PolicyConfig,
) -> Money {
    if shortfall <= 0 {
        return 0;
    }
    let target = state.cash(player) + shortfall;
    let mut exclusions = Exclusions::default();

    loop {
        let outstanding = target - state.cash(player);
        if outstanding <= 0 {
            return 0;
        }
        let planned = plan(state, player, outstanding, policy, &exclusions);
        if planned.uncovered > 0 {
            debug!(
                player,
                outstanding,
                uncovered = planned.uncovered,
                "holdings cannot cover shortfall"
            );
            return outstanding;
        }

        let mut declined = false;
        for step in planned.steps {
            if state.cash(player) >= target {
                break;
            }
            match execute(state, players, player, step.action, policy) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(player, action = ?step.action, "sale declined by every buyer");
                    match step.action {
                        LiquidationAction::SellJailCard => exclusions.jail_cards = true,
                        LiquidationAction::SellTitle(tile) => {
                            exclusions.titles.insert(tile);
                        }
                        _ => {}
                    }
                    declined = true;
                    break;
                }
                Err(err) => {
                    warn!(player, action = ?step.action, %err, "liquidation step failed");
                    return (target - state.cash(player)).max(0);
                }
            }
        }

        if !declined {
            return (target - state.cash(player)).max(0);
        }
    }
}

fn execute<P: BasePlayer>(
    state: &mut GameState,
    players: &[P],
    player: PlayerId,
    action: LiquidationAction,
    policy: &PolicyConfig,
) -> Result<bool, GameError> {
    match action {
        LiquidationAction::Mortgage(tile) => state.mortgage(player, tile).map(|_| true),
        LiquidationAction::Demolish(tile) => state.demolish(player, tile).map(|_| true),
        LiquidationAction::SellJailCard => {
            let price = state.config.jail_card_value;
            sell_to_market(state, players, player, TradeItem::JailCards(1), price, policy)
        }
        LiquidationAction::SellTitle(tile) => {
            let asset = state.board.asset(tile).ok_or(GameError::NotOwnable(tile))?;
            let price = if asset.mortgaged {
                state.unmortgage_price(tile)
            } else {
                asset.spec().cost
            };
            sell_to_market(state, players, player, TradeItem::Tile(tile), price, policy)
        }
    }
}

/// Offers `item` to every other active player in seat order at each markup of the
/// policy, highest first, until someone accepts.
pub fn sell_to_market<P: BasePlayer>(
    state: &mut GameState,
    players: &[P],
    seller: PlayerId,
    item: TradeItem,
    base_price: Money,
    policy: &PolicyConfig,
) -> Result<bool, GameError> {
    let buyers: Vec<PlayerId> = state.opponents(seller).map(|p| p.index).collect();
    for (markup, &buyer) in policy.sale_markups.iter().cartesian_product(&buyers) {
        let price = scale(base_price, *markup);
        let offer = TradeOffer::new(seller, buyer, [item], [TradeItem::Cash(price)]);
        if state.validate_offer(&offer).is_err() {
            continue;
        }
        if negotiation::propose(state, players, &offer)? {
            debug!(seller, buyer, ?item, price, "sold to market");
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::players::ScriptedPlayer;

    fn make_state(num_players: usize) -> GameState {
        GameState::new(GameConfig {
            num_players,
            ..GameConfig::default()
        })
        .unwrap()
    }

    fn buyers(budget: Option<Money>, n: usize) -> Vec<ScriptedPlayer> {
        (0..n)
            .map(|_| ScriptedPlayer {
                trade_budget: budget,
                ..ScriptedPlayer::default()
            })
            .collect()
    }

    #[test]
    fn plan_follows_policy_order() {
        let mut state = make_state(2);
        state.players[0].jail_cards = 1;
        state.assign_title(6, Some(0)).unwrap();
        state.assign_title(5, Some(0)).unwrap();
        state.assign_title(12, Some(0)).unwrap();
        let before = state.clone();
        let plan = plan(&state, 0, 230, &PolicyConfig::default(), &Exclusions::default());
        let actions: Vec<_> = plan.steps.iter().map(|s| s.action).collect();
        assert_eq!(
            actions,
            vec![
                LiquidationAction::SellJailCard,
                LiquidationAction::Mortgage(6),
                LiquidationAction::Mortgage(12),
                LiquidationAction::Mortgage(5),
            ]
        );
        assert_eq!(plan.uncovered, 0);
        assert_eq!(state.board, before.board);
    }

    #[test]
    fn plan_reports_what_cannot_be_covered() {
        let mut state = make_state(2);
        state.assign_title(1, Some(0)).unwrap();
        let plan = plan(&state, 0, 1_000, &PolicyConfig::default(), &Exclusions::default());
        assert_eq!(plan.uncovered, 1_000 - 30 - 30);
    }

    #[test]
    fn pending_purchase_completes_the_group_on_paper() {
        let mut state = make_state(2);
        state.assign_title(37, Some(0)).unwrap();
        state.players[0].position = 39;
        let plan = plan(&state, 0, 100, &PolicyConfig::default(), &Exclusions::default());
        assert_eq!(plan.steps[0].class, LiquidationClass::MortgageSetProperty);
        assert_eq!(plan.steps[0].action, LiquidationAction::Mortgage(37));
    }

    #[test]
    fn buildings_come_down_evenly() {
        let mut state = make_state(2);
        state.assign_title(1, Some(0)).unwrap();
        state.assign_title(3, Some(0)).unwrap();
        state.build(0, 1).unwrap();
        state.build(0, 3).unwrap();
        state.build(0, 1).unwrap();
        state.players[0].cash = 0;
        let players = buyers(None, 2);
        assert_eq!(raise(&mut state, &players, 0, 50, &PolicyConfig::default()), 0);
        assert_eq!(state.cash(0), 50);
        let (min, max) = state.board.group_building_range(ColorGroup::Brown);
        assert_eq!((min, max), (0, 1));
    }

    #[test]
    fn declined_sales_fall_through_to_later_classes() {
        let mut state = make_state(3);
        state.players[0].jail_cards = 1;
        state.assign_title(6, Some(0)).unwrap();
        state.assign_title(1, Some(0)).unwrap();
        state.assign_title(3, Some(0)).unwrap();
        state.players[0].cash = 1_000;
        for _ in 0..2 {
            state.build(0, 1).unwrap();
            state.build(0, 3).unwrap();
        }
        state.players[0].cash = 0;

        let players = buyers(None, 3);
        let remaining = raise(&mut state, &players, 0, 100, &PolicyConfig::default());
        assert_eq!(remaining, 0);
        assert_eq!(state.cash(0), 100);
        assert_eq!(state.players[0].jail_cards, 1);
        assert!(state.board.asset(6).unwrap().mortgaged);
        assert_eq!(state.board.asset(1).unwrap().buildings, 1);
        assert_eq!(state.board.asset(3).unwrap().buildings, 1);
    }

    #[test]
    fn market_sale_walks_down_the_markups() {
        let mut state = make_state(2);
        state.players[0].cash = 0;
        state.assign_title(5, Some(0)).unwrap();
        let policy = PolicyConfig {
            liquidation_order: vec![LiquidationClass::SellRailroad],
            ..PolicyConfig::default()
        };
        let players = buyers(Some(450), 2);
        assert_eq!(raise(&mut state, &players, 0, 150, &policy), 0);
        assert_eq!(state.board.owner(5), Some(1));
        assert_eq!(state.cash(0), 400);
        assert_eq!(state.cash(1), 1100);
    }

    #[test]
    fn nothing_is_dismantled_when_the_debt_is_hopeless() {
        let mut state = make_state(2);
        state.players[0].cash = 0;
        state.assign_title(39, Some(0)).unwrap();
        let players = buyers(None, 2);
        assert_eq!(raise(&mut state, &players, 0, 2_000, &PolicyConfig::default()), 2_000);
        assert!(!state.board.asset(39).unwrap().mortgaged);
        assert_eq!(state.cash(0), 0);
    }

    #[test]
    fn broke_player_without_assets_raises_nothing() {
        let mut state = make_state(2);
        state.players[0].cash = 0;
        let players = buyers(None, 2);
        assert_eq!(raise(&mut state, &players, 0, 50, &PolicyConfig::default()), 50);
    }
}

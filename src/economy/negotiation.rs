//! Trade generation and evaluation.

use tracing::{debug, info};

use crate::board::{group_members, tile_spec};
use crate::economy::valuation::{Bundle, usable_money, value};
use crate::game::config::PolicyConfig;
use crate::game::trade::{TradeItem, TradeOffer, cash_in, tiles_in};
use crate::game::{GameError, GameState};
use crate::players::BasePlayer;
use crate::types::{ColorGroup, Money, PlayerId, TileId};

/// Tiles `player` is missing from groups where it holds all but one, each held by another
/// active player.
pub fn near_sets(state: &GameState, player: PlayerId) -> Vec<TileId> {
    ColorGroup::ALL
        .into_iter()
        .filter_map(|group| {
            let members = group_members(group);
            let mut missing = members
                .iter()
                .filter(|tile| state.board.owner(**tile) != Some(player));
            let tile = *missing.next()?;
            if missing.next().is_some() {
                return None;
            }
            let owner = state.board.owner(tile)?;
            state.is_active(owner).then_some(tile)
        })
        .collect()
}

pub fn holds_sets(state: &GameState, player: PlayerId) -> bool {
    !state.board.completed_groups(player).is_empty()
}

/// Opponents hold completed groups while `player` holds none.
pub fn is_behind(state: &GameState, player: PlayerId) -> bool {
    !holds_sets(state, player) && state.opponents(player).any(|p| holds_sets(state, p.index))
}

pub fn nobody_holds_sets(state: &GameState) -> bool {
    state.active_players().all(|p| !holds_sets(state, p.index))
}

/// Whether receiving `tile` gives `player` the whole of its group.
pub fn completes_group(state: &GameState, player: PlayerId, tile: TileId) -> bool {
    let Some(group) = tile_spec(tile).group else {
        return false;
    };
    group_members(group)
        .iter()
        .all(|member| *member == tile || state.board.owner(*member) == Some(player))
}

/// Offers `proposer` would make for `tile`, most attractive to the proposer first.
pub fn candidate_offers(
    state: &GameState,
    proposer: PlayerId,
    tile: TileId,
    policy: &PolicyConfig,
) -> Vec<TradeOffer> {
    let Some(owner) = state.board.owner(tile).filter(|o| *o != proposer) else {
        return Vec::new();
    };
    let spec = tile_spec(tile);
    let usable = usable_money(state, proposer, false, true);
    let behind = is_behind(state, proposer);
    let mut offers = Vec::new();

    if completes_group(state, proposer, tile) {
        let tradables = near_sets(state, owner).into_iter().filter(|t| {
            state.board.owner(*t) == Some(proposer)
                && (spec.group.is_none() || tile_spec(*t).group != spec.group)
        });
        for tradable in tradables {
            let diff = tile_spec(tradable).cost - spec.cost;
            if diff < 0 {
                for &exponent in &policy.swap_exponents {
                    if !behind && exponent > policy.swap_cutoff {
                        break;
                    }
                    let pay = weighted_delta(-diff, exponent);
                    if pay > usable {
                        continue;
                    }
                    offers.push(TradeOffer::new(
                        proposer,
                        owner,
                        with_cash(TradeItem::Tile(tradable), pay),
                        [TradeItem::Tile(tile)],
                    ));
                }
            } else {
                for &exponent in policy.swap_exponents.iter().rev() {
                    if !behind && exponent < policy.swap_cutoff {
                        continue;
                    }
                    let ask = weighted_delta(diff, exponent);
                    offers.push(TradeOffer::new(
                        proposer,
                        owner,
                        [TradeItem::Tile(tradable)],
                        with_cash(TradeItem::Tile(tile), ask),
                    ));
                }
            }
        }
    }

    let cutoff = if behind || nobody_holds_sets(state) {
        policy.cash_offer_cutoff_behind
    } else {
        policy.cash_offer_cutoff
    };
    for &factor in &policy.cash_offer_factors {
        if factor > cutoff {
            break;
        }
        let giving = (spec.cost as f64 * factor).round() as Money;
        if giving > usable {
            continue;
        }
        offers.push(TradeOffer::new(
            proposer,
            owner,
            [TradeItem::Cash(giving)],
            [TradeItem::Tile(tile)],
        ));
    }
    offers
}

fn weighted_delta(diff: Money, exponent: f64) -> Money {
    (diff as f64).powf(exponent).round() as Money
}

fn with_cash(item: TradeItem, cash: Money) -> Vec<TradeItem> {
    if cash > 0 {
        vec![item, TradeItem::Cash(cash)]
    } else {
        vec![item]
    }
}

/// Runs through the candidate offers for `tile` until one is accepted.
pub fn try_acquire<P: BasePlayer>(
    state: &mut GameState,
    players: &[P],
    proposer: PlayerId,
    tile: TileId,
    policy: &PolicyConfig,
) -> Result<bool, GameError> {
    for offer in candidate_offers(state, proposer, tile, policy) {
        if state.validate_offer(&offer).is_err() {
            continue;
        }
        if propose(state, players, &offer)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Sends `offer` to its recipient and executes it on acceptance. A declined offer leaves
/// the game untouched.
pub fn propose<P: BasePlayer>(
    state: &mut GameState,
    players: &[P],
    offer: &TradeOffer,
) -> Result<bool, GameError> {
    state.validate_offer(offer)?;
    let recipient = players
        .get(offer.recipient)
        .ok_or(GameError::InvalidPlayer(offer.recipient))?;
    if !recipient.receive_trade_offer(state, offer.recipient, offer) {
        debug!(
            proposer = offer.proposer,
            recipient = offer.recipient,
            "trade declined"
        );
        return Ok(false);
    }
    state.execute_trade(offer)?;
    info!(
        proposer = offer.proposer,
        recipient = offer.recipient,
        offered = ?offer.offered,
        requested = ?offer.requested,
        "trade accepted"
    );
    Ok(true)
}

/// Decides an offer from the recipient's side: it must not lose value and must gain at
/// least as much as the proposer.
pub fn evaluate(state: &GameState, me: PlayerId, offer: &TradeOffer) -> bool {
    let giving = offer.given_by(me);
    let receiving = offer.received_by(me);
    let other = offer.counterpart(me);

    if cash_in(giving) > state.cash(me) {
        return false;
    }

    let gives_title = tiles_in(giving).next().is_some();
    let completes_mine = tiles_in(receiving).any(|tile| {
        tile_spec(tile).group.is_some_and(|group| {
            group_members(group).iter().all(|member| {
                let incoming = tiles_in(receiving).any(|t| t == *member);
                let kept = state.board.owner(*member) == Some(me)
                    && !tiles_in(giving).any(|t| t == *member);
                incoming || kept
            })
        })
    });
    let mine = holds_sets(state, me);
    let others = state.opponents(me).any(|p| holds_sets(state, p.index));

    if !mine && others && gives_title && !completes_mine {
        return false;
    }
    if mine && !others && gives_title {
        return false;
    }

    let my_delta = value(state, &Bundle::after_trade(state, me, offer), me)
        - value(state, &Bundle::holdings_of(state, me), me);
    let their_delta = value(state, &Bundle::after_trade(state, other, offer), other)
        - value(state, &Bundle::holdings_of(state, other), other);
    my_delta >= 0 && my_delta >= their_delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::players::AiPlayer;

    fn make_state(num_players: usize) -> GameState {
        GameState::new(GameConfig {
            num_players,
            ..GameConfig::default()
        })
        .unwrap()
    }

    fn ai_players(n: usize) -> Vec<AiPlayer> {
        (0..n).map(|_| AiPlayer::default()).collect()
    }

    #[test]
    fn near_sets_need_an_active_holder() {
        let mut state = make_state(3);
        state.assign_title(16, Some(0)).unwrap();
        state.assign_title(18, Some(0)).unwrap();
        assert!(near_sets(&state, 0).is_empty());
        state.assign_title(19, Some(1)).unwrap();
        assert_eq!(near_sets(&state, 0), vec![19]);
        assert!(near_sets(&state, 1).is_empty());
    }

    #[test]
    fn fairness_rejects_lopsided_gains() {
        let mut state = make_state(2);
        state.assign_title(1, Some(1)).unwrap();
        state.assign_title(3, Some(0)).unwrap();
        // Player 0 would complete brown for a small premium.
        let offer = TradeOffer::new(0, 1, [TradeItem::Cash(100)], [TradeItem::Tile(1)]);
        assert!(!evaluate(&state, 1, &offer));
    }

    #[test]
    fn overpaying_cash_is_accepted() {
        let mut state = make_state(2);
        state.assign_title(39, Some(1)).unwrap();
        let offer = TradeOffer::new(0, 1, [TradeItem::Cash(500)], [TradeItem::Tile(39)]);
        assert!(evaluate(&state, 1, &offer));
        let too_much = TradeOffer::new(1, 0, [TradeItem::Tile(39)], [TradeItem::Cash(5_000)]);
        assert!(!evaluate(&state, 0, &too_much));
    }

    #[test]
    fn setless_recipient_keeps_titles_when_others_have_sets() {
        let mut state = make_state(3);
        state.assign_title(37, Some(2)).unwrap();
        state.assign_title(39, Some(2)).unwrap();
        state.assign_title(5, Some(1)).unwrap();
        let offer = TradeOffer::new(0, 1, [TradeItem::Cash(1_000)], [TradeItem::Tile(5)]);
        assert!(!evaluate(&state, 1, &offer));
    }

    #[test]
    fn sole_set_holder_never_gives_titles() {
        let mut state = make_state(2);
        state.assign_title(37, Some(1)).unwrap();
        state.assign_title(39, Some(1)).unwrap();
        state.assign_title(5, Some(1)).unwrap();
        let offer = TradeOffer::new(0, 1, [TradeItem::Cash(1_000)], [TradeItem::Tile(5)]);
        assert!(!evaluate(&state, 1, &offer));
        state.assign_title(6, Some(0)).unwrap();
        let buying = TradeOffer::new(0, 1, [TradeItem::Tile(6)], [TradeItem::Cash(50)]);
        assert!(evaluate(&state, 1, &buying));
    }

    #[test]
    fn cash_offers_climb_to_the_cutoff() {
        let mut state = make_state(3);
        state.assign_title(16, Some(0)).unwrap();
        state.assign_title(18, Some(0)).unwrap();
        state.assign_title(19, Some(1)).unwrap();
        state.assign_title(37, Some(2)).unwrap();
        state.assign_title(39, Some(2)).unwrap();
        state.players[0].cash = 100_000;
        let offers = candidate_offers(&state, 0, 19, &PolicyConfig::default());
        let amounts: Vec<Money> = offers.iter().map(|o| cash_in(&o.offered)).collect();
        // Behind: player 2 holds a set and player 0 does not.
        assert_eq!(amounts, vec![200, 300, 400, 500, 600, 700]);
        assert!(offers.iter().all(|o| o.recipient == 1));
    }

    #[test]
    fn swaps_pay_the_weighted_cost_difference() {
        let mut state = make_state(2);
        // Player 0 needs 39 to finish dark blue, player 1 needs 3 to finish brown.
        state.assign_title(37, Some(0)).unwrap();
        state.assign_title(3, Some(0)).unwrap();
        state.assign_title(39, Some(1)).unwrap();
        state.assign_title(1, Some(1)).unwrap();
        state.players[0].cash = 100_000;
        let offers = candidate_offers(&state, 0, 39, &PolicyConfig::default());
        let swaps: Vec<&TradeOffer> = offers
            .iter()
            .filter(|o| tiles_in(&o.offered).next() == Some(3))
            .collect();
        let pays: Vec<Money> = swaps.iter().map(|o| cash_in(&o.offered)).collect();
        let diff = 400.0f64 - 60.0;
        assert_eq!(
            pays,
            vec![diff.powf(1.15).round() as Money, diff.powf(1.2).round() as Money]
        );
    }

    #[test]
    fn accepted_proposal_executes_and_declined_changes_nothing() {
        let mut state = make_state(2);
        let players = ai_players(2);
        state.assign_title(39, Some(1)).unwrap();
        let before = state.clone();
        let stingy = TradeOffer::new(0, 1, [TradeItem::Cash(10)], [TradeItem::Tile(39)]);
        assert!(!propose(&mut state, &players, &stingy).unwrap());
        assert_eq!(state.board, before.board);
        assert_eq!(state.players, before.players);
        assert_eq!(state.log, before.log);

        let generous = TradeOffer::new(0, 1, [TradeItem::Cash(600)], [TradeItem::Tile(39)]);
        assert!(propose(&mut state, &players, &generous).unwrap());
        assert_eq!(state.board.owner(39), Some(0));
        assert_eq!(state.cash(0) + state.cash(1), 3000);
    }
}

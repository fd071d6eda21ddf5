use monopolytron_rs::board::group_members;
use monopolytron_rs::economy::liquidation::{Exclusions, LiquidationAction, plan, raise};
use monopolytron_rs::economy::negotiation::{evaluate, propose};
use monopolytron_rs::economy::{Bundle, run_auction, value};
use monopolytron_rs::game::{
    Game, GameConfig, GameError, GameEvent, GameState, LiquidationClass, PolicyConfig, TradeItem,
    TradeOffer,
};
use monopolytron_rs::players::{AiPlayer, ScriptedPlayer};
use monopolytron_rs::types::ColorGroup;

fn make_state(num_players: usize) -> GameState {
    GameState::new(GameConfig {
        num_players,
        ..GameConfig::default()
    })
    .unwrap()
}

#[test]
fn cash_for_the_last_orange_is_accepted_when_fair() {
    let mut state = make_state(2);
    state.assign_title(16, Some(0)).unwrap();
    state.assign_title(18, Some(0)).unwrap();
    state.assign_title(19, Some(1)).unwrap();
    let players = vec![AiPlayer; 2];

    let stingy = TradeOffer::new(0, 1, [TradeItem::Cash(600)], [TradeItem::Tile(19)]);
    assert!(!evaluate(&state, 1, &stingy));
    assert!(!propose(&mut state, &players, &stingy).unwrap());
    assert_eq!(state.board.owner(19), Some(1));

    let fair = TradeOffer::new(0, 1, [TradeItem::Cash(700)], [TradeItem::Tile(19)]);
    assert!(evaluate(&state, 1, &fair));
    assert!(propose(&mut state, &players, &fair).unwrap());
    assert!(state.board.owns_group(0, ColorGroup::Orange));
    assert_eq!(state.cash(0), 800);
    assert_eq!(state.cash(1), 2_200);
}

#[test]
fn broke_player_is_eliminated_in_favour_of_the_creditor() {
    let mut state = make_state(2);
    state.assign_title(1, Some(0)).unwrap();
    state.mortgage(0, 1).unwrap();
    state.players[0].cash = 0;
    let players = vec![ScriptedPlayer::default(), ScriptedPlayer::default()];

    let policy = state.config.policy.clone();
    assert_eq!(raise(&mut state, &players, 0, 50, &policy), 50);
    assert!(!state.spend(&players, 0, 50, Some(1)).unwrap());

    assert!(!state.is_active(0));
    assert_eq!(state.winner(), Some(1));
    assert_eq!(state.board.owner(1), Some(1));
    assert!(state.board.asset(1).unwrap().mortgaged);
    assert!(state.log.iter().any(|event| matches!(
        event,
        GameEvent::Bankrupt { player: 0, creditor: Some(1) }
    )));
}

#[test]
fn auction_winner_pays_exactly_its_bid() {
    let mut state = make_state(3);
    let players = vec![
        ScriptedPlayer::with_bids([0]),
        ScriptedPlayer::with_bids([0]),
        ScriptedPlayer::with_bids([50]),
    ];
    assert_eq!(run_auction(&mut state, &players, 25).unwrap(), Some((2, 50)));
    assert_eq!(state.board.owner(25), Some(2));
    assert_eq!(state.cash(2), 1_450);
    assert_eq!(state.cash(0) + state.cash(1), 3_000);
}

#[test]
fn set_mortgages_skip_groups_with_buildings() {
    let mut state = make_state(2);
    for tile in [1, 3, 6, 8, 9] {
        state.assign_title(tile, Some(0)).unwrap();
    }
    state.build(0, 1).unwrap();
    state.build(0, 3).unwrap();
    let policy = PolicyConfig {
        liquidation_order: vec![LiquidationClass::MortgageSetProperty],
        ..PolicyConfig::default()
    };

    let planned = plan(&state, 0, 10_000, &policy, &Exclusions::default());
    let actions: Vec<_> = planned.steps.iter().map(|step| step.action).collect();
    assert_eq!(
        actions,
        vec![
            LiquidationAction::Mortgage(6),
            LiquidationAction::Mortgage(8),
            LiquidationAction::Mortgage(9),
        ]
    );
    assert_eq!(planned.uncovered, 10_000 - 50 - 50 - 60);
}

#[test]
fn value_grows_with_cash_and_completed_sets() {
    let mut state = make_state(2);
    state.assign_title(37, Some(0)).unwrap();
    let one = value(&state, &Bundle::holdings_of(&state, 0), 0);

    let mut richer = Bundle::holdings_of(&state, 0);
    richer.cash += 1;
    assert_eq!(value(&state, &richer, 0), one + 1);

    state.assign_title(39, Some(0)).unwrap();
    let set = value(&state, &Bundle::holdings_of(&state, 0), 0);
    let tiles: i64 = group_members(ColorGroup::DarkBlue)
        .iter()
        .map(|tile| monopolytron_rs::board::tile_spec(*tile).cost)
        .sum();
    assert_eq!(set, 1_500 + 3 * tiles);
}

#[test]
fn failed_trades_change_nothing() {
    let mut state = make_state(2);
    state.assign_title(1, Some(0)).unwrap();
    let before = state.to_json().unwrap();
    let offer = TradeOffer::new(0, 1, [TradeItem::Tile(1), TradeItem::Tile(3)], [TradeItem::Cash(10)]);
    assert!(matches!(state.execute_trade(&offer), Err(GameError::Trade(_))));
    assert_eq!(state.to_json().unwrap(), before);
}

#[test]
fn building_stays_even_within_a_group() {
    let mut state = make_state(2);
    state.assign_title(1, Some(0)).unwrap();
    state.assign_title(3, Some(0)).unwrap();
    state.build(0, 1).unwrap();
    assert!(matches!(state.build(0, 1), Err(GameError::UnevenBuilding(1))));
    state.build(0, 3).unwrap();
    state.build(0, 1).unwrap();
    assert_eq!(state.board.group_building_range(ColorGroup::Brown), (1, 2));
}

#[test]
fn restored_snapshots_replay_identically() {
    let players = vec![AiPlayer; 3];
    let mut game = Game::new(GameConfig {
        num_players: 3,
        seed: 7,
        ..GameConfig::default()
    })
    .unwrap();
    for _ in 0..20 {
        game.play_turn(&players).unwrap();
    }

    let snapshot = game.state.to_json().unwrap();
    let mut restored = Game::from_state(GameState::from_json(&snapshot).unwrap());
    assert_eq!(restored.state.to_json().unwrap(), snapshot);

    for _ in 0..20 {
        game.play_turn(&players).unwrap();
        restored.play_turn(&players).unwrap();
    }
    assert_eq!(restored.state.to_json().unwrap(), game.state.to_json().unwrap());
}

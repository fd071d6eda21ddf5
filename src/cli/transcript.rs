//! Human-readable rendering of the action log.

use crate::board::cards;
use crate::board::tile_spec;
use crate::game::{ActionLog, GameEvent};
use crate::types::{DeckKind, Edition, TileId};

fn tile_name(tile: TileId, edition: Edition) -> &'static str {
    tile_spec(tile).name(edition)
}

pub fn describe(event: &GameEvent, edition: Edition) -> String {
    let c = edition.currency();
    let name = |tile| tile_name(tile, edition);
    match *event {
        GameEvent::Roll { player, dice: (a, b) } => format!("P{player} rolls {a}+{b}"),
        GameEvent::PassGo { player, amount, cash } => {
            format!("P{player} passes Go and collects {c}{amount} ({c}{cash})")
        }
        GameEvent::Land { player, tile, cash } => {
            format!("P{player} lands on {} ({c}{cash})", name(tile))
        }
        GameEvent::Owns { player, tile } => format!("P{player} owns {}", name(tile)),
        GameEvent::Rent { player, owner, tile, amount } => {
            format!("P{player} owes P{owner} {c}{amount} rent for {}", name(tile))
        }
        GameEvent::Spend { player, amount, cash } => {
            format!("P{player} pays the bank {c}{amount} ({c}{cash})")
        }
        GameEvent::Pay { player, to, amount, cash, to_cash } => {
            format!("P{player} pays P{to} {c}{amount} ({c}{cash} / {c}{to_cash})")
        }
        GameEvent::Earn { player, amount, cash } => {
            format!("P{player} receives {c}{amount} ({c}{cash})")
        }
        GameEvent::ReceiveTitle { player, tile } => {
            format!("P{player} receives the title to {}", name(tile))
        }
        GameEvent::Mortgage { player, tile, amount, .. } => {
            format!("P{player} mortgages {} for {c}{amount}", name(tile))
        }
        GameEvent::Unmortgage { player, tile, amount, .. } => {
            format!("P{player} lifts the mortgage on {} for {c}{amount}", name(tile))
        }
        GameEvent::Build { player, tile, buildings, .. } => {
            format!("P{player} builds on {} ({buildings} buildings)", name(tile))
        }
        GameEvent::Demolish { player, tile, buildings, amount, .. } => format!(
            "P{player} sells a building on {} for {c}{amount} ({buildings} left)",
            name(tile)
        ),
        GameEvent::TradeTile { from, to, tile } => {
            format!("P{from} hands {} to P{to}", name(tile))
        }
        GameEvent::TradeJailCard { from, to, count } => {
            format!("P{from} hands {count} jail card(s) to P{to}")
        }
        GameEvent::AuctionStart { tile } => format!("{} goes up for auction", name(tile)),
        GameEvent::AuctionEnd { tile, winner, bid } => {
            format!("P{winner} wins {} at auction for {c}{bid}", name(tile))
        }
        GameEvent::AuctionUnsold { tile } => format!("{} stays with the bank", name(tile)),
        GameEvent::Bankrupt { player, creditor: Some(creditor) } => {
            format!("P{player} is bankrupt; assets go to P{creditor}")
        }
        GameEvent::Bankrupt { player, creditor: None } => {
            format!("P{player} is bankrupt; assets go to the bank")
        }
        GameEvent::DrawCard { player, deck, card } => {
            let deck_name = match deck {
                DeckKind::Chance => "Chance",
                DeckKind::CommunityChest => "Community Chest",
            };
            let text = cards::card(deck, card).map_or("?", |card| card.text);
            format!("P{player} draws {deck_name}: {text}")
        }
        GameEvent::Jail { player } => format!("P{player} goes to jail"),
        GameEvent::ThreeDoublesToJail { player } => {
            format!("P{player} rolls three doubles and goes to jail")
        }
        GameEvent::UseJailCard { player } => format!("P{player} uses a get out of jail card"),
        GameEvent::PayJailFine { player } => format!("P{player} pays the jail fine"),
        GameEvent::DoublesOutOfJail { player } => format!("P{player} rolls doubles out of jail"),
        GameEvent::StayInJail { player } => format!("P{player} stays in jail"),
    }
}

/// One line per event, with a header for every completed turn.
pub fn render(log: &ActionLog, edition: Edition) -> Vec<String> {
    let mut lines = Vec::with_capacity(log.len() + log.turns().len());
    for (index, turn) in log.turns().iter().enumerate() {
        lines.push(format!("-- turn {} --", index + 1));
        lines.extend(turn.iter().map(|event| format!("  {}", describe(event, edition))));
    }
    if !log.current_turn().is_empty() {
        lines.push("-- in progress --".to_string());
        lines.extend(
            log.current_turn()
                .iter()
                .map(|event| format!("  {}", describe(event, edition))),
        );
    }
    lines
}

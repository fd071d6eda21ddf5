use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::types::{DeckKind, Money, TileId, TileKind};

/// Where an advance card sends the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceTarget {
    Tile(TileId),
    Nearest(TileKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardEffect {
    Advance(AdvanceTarget),
    Back(u8),
    Earn(Money),
    Spend(Money),
    GoToJail,
    JailCard,
    EarnFromEachPlayer(Money),
    PayEachPlayer(Money),
    Repairs { house: Money, hotel: Money },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub id: u8,
    pub text: &'static str,
    pub effect: CardEffect,
}

static CHANCE: Lazy<Vec<Card>> = Lazy::new(|| {
    use AdvanceTarget::*;
    use CardEffect::*;
    build_deck(&[
        ("Advance to Go", Advance(Tile(0))),
        ("Advance to Illinois Avenue", Advance(Tile(24))),
        ("Advance to St. Charles Place", Advance(Tile(11))),
        ("Advance to the nearest Utility", Advance(Nearest(TileKind::Utility))),
        ("Advance to the nearest Railroad", Advance(Nearest(TileKind::Railroad))),
        ("Advance to the nearest Railroad", Advance(Nearest(TileKind::Railroad))),
        ("Bank pays you dividend", Earn(50)),
        ("Get out of Jail free", JailCard),
        ("Go back three spaces", Back(3)),
        ("Go to Jail", GoToJail),
        ("Make general repairs on all your property", Repairs { house: 25, hotel: 100 }),
        ("Speeding fine", Spend(15)),
        ("Take a trip to Reading Railroad", Advance(Tile(5))),
        ("Advance to Boardwalk", Advance(Tile(39))),
        ("You have been elected Chairman of the Board", PayEachPlayer(50)),
        ("Your building loan matures", Earn(150)),
    ])
});

static COMMUNITY_CHEST: Lazy<Vec<Card>> = Lazy::new(|| {
    use CardEffect::*;
    build_deck(&[
        ("Advance to Go", Advance(AdvanceTarget::Tile(0))),
        ("Bank error in your favour", Earn(200)),
        ("Doctor's fee", Spend(50)),
        ("From sale of stock you get", Earn(50)),
        ("Get out of Jail free", JailCard),
        ("Go to Jail", GoToJail),
        ("Holiday fund matures", Earn(100)),
        ("Income tax refund", Earn(20)),
        ("It is your birthday", EarnFromEachPlayer(10)),
        ("Life insurance matures", Earn(100)),
        ("Pay hospital fees", Spend(100)),
        ("Pay school fees", Spend(50)),
        ("Receive consultancy fee", Earn(25)),
        ("You are assessed for street repairs", Repairs { house: 40, hotel: 115 }),
        ("You have won second prize in a beauty contest", Earn(10)),
        ("You inherit", Earn(100)),
    ])
});

fn build_deck(entries: &[(&'static str, CardEffect)]) -> Vec<Card> {
    entries
        .iter()
        .enumerate()
        .map(|(id, (text, effect))| Card {
            id: id as u8,
            text: *text,
            effect: *effect,
        })
        .collect()
}

pub fn deck(kind: DeckKind) -> &'static [Card] {
    match kind {
        DeckKind::Chance => &CHANCE,
        DeckKind::CommunityChest => &COMMUNITY_CHEST,
    }
}

pub fn card(kind: DeckKind, id: u8) -> Option<&'static Card> {
    deck(kind).get(id as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decks_have_sixteen_cards_with_one_jail_card() {
        for kind in [DeckKind::Chance, DeckKind::CommunityChest] {
            let cards = deck(kind);
            assert_eq!(cards.len(), 16);
            let jail_cards = cards
                .iter()
                .filter(|c| c.effect == CardEffect::JailCard)
                .count();
            assert_eq!(jail_cards, 1);
        }
    }

    #[test]
    fn card_lookup_by_id() {
        let found = card(DeckKind::Chance, 9).unwrap();
        assert_eq!(found.effect, CardEffect::GoToJail);
        assert!(card(DeckKind::Chance, 16).is_none());
    }
}

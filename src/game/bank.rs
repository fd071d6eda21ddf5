use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::board::cards::{self, Card};
use crate::types::DeckKind;

/// The two card decks. Cards are held by id; a deck is reshuffled in full once empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    chance: Vec<u8>,
    community_chest: Vec<u8>,
}

impl Bank {
    pub fn standard(rng: &mut impl rand::Rng) -> Self {
        Self {
            chance: shuffled(DeckKind::Chance, rng),
            community_chest: shuffled(DeckKind::CommunityChest, rng),
        }
    }

    pub fn draw(&mut self, kind: DeckKind, rng: &mut impl rand::Rng) -> Option<&'static Card> {
        let deck = self.deck_mut(kind);
        if deck.is_empty() {
            *deck = shuffled(kind, rng);
        }
        let id = deck.pop()?;
        cards::card(kind, id)
    }

    pub fn remaining(&self, kind: DeckKind) -> usize {
        match kind {
            DeckKind::Chance => self.chance.len(),
            DeckKind::CommunityChest => self.community_chest.len(),
        }
    }

    fn deck_mut(&mut self, kind: DeckKind) -> &mut Vec<u8> {
        match kind {
            DeckKind::Chance => &mut self.chance,
            DeckKind::CommunityChest => &mut self.community_chest,
        }
    }
}

fn shuffled(kind: DeckKind, rng: &mut impl rand::Rng) -> Vec<u8> {
    let mut ids: Vec<u8> = cards::deck(kind).iter().map(|card| card.id).collect();
    ids.shuffle(rng);
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn deck_refills_when_exhausted() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut bank = Bank::standard(&mut rng);
        for _ in 0..16 {
            assert!(bank.draw(DeckKind::Chance, &mut rng).is_some());
        }
        assert_eq!(bank.remaining(DeckKind::Chance), 0);
        assert!(bank.draw(DeckKind::Chance, &mut rng).is_some());
        assert_eq!(bank.remaining(DeckKind::Chance), 15);
        assert_eq!(bank.remaining(DeckKind::CommunityChest), 16);
    }

    #[test]
    fn same_seed_same_order() {
        let a = Bank::standard(&mut StdRng::seed_from_u64(3));
        let b = Bank::standard(&mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}

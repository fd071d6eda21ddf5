use serde::{Deserialize, Serialize};

use crate::board::{BOARD_SIZE, GO_TILE, JAIL_TILE};
use crate::types::{Money, PlayerId, TileId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub index: PlayerId,
    pub cash: Money,
    pub position: TileId,
    pub jail_cards: u32,
    pub in_jail: bool,
    pub jail_rolls: u8,
    pub eliminated: bool,
}

impl PlayerState {
    pub fn new(index: PlayerId, cash: Money) -> Self {
        Self {
            index,
            cash,
            position: GO_TILE,
            jail_cards: 0,
            in_jail: false,
            jail_rolls: 0,
            eliminated: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.eliminated
    }

    /// Moves forward `steps` tiles and reports whether Go was passed or landed on.
    pub fn advance(&mut self, steps: usize) -> bool {
        let target = self.position + steps;
        self.position = target % BOARD_SIZE;
        target >= BOARD_SIZE
    }

    /// Moves to `tile` going forward; returns true when the move wraps past Go. Staying
    /// put on Go does not count.
    pub fn advance_to(&mut self, tile: TileId) -> bool {
        let passed = tile < self.position;
        self.position = tile;
        passed
    }

    pub fn move_back(&mut self, steps: usize) {
        self.position = (self.position + BOARD_SIZE - steps % BOARD_SIZE) % BOARD_SIZE;
    }

    pub fn send_to_jail(&mut self) {
        self.position = JAIL_TILE;
        self.in_jail = true;
        self.jail_rolls = 0;
    }

    pub fn release_from_jail(&mut self) {
        self.in_jail = false;
        self.jail_rolls = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_past_go_wraps() {
        let mut player = PlayerState::new(0, 1500);
        player.position = 38;
        assert!(player.advance(4));
        assert_eq!(player.position, 2);
        assert!(!player.advance(5));
        assert_eq!(player.position, 7);
    }

    #[test]
    fn advance_to_detects_wrap() {
        let mut player = PlayerState::new(0, 1500);
        player.position = 36;
        assert!(player.advance_to(5));
        assert!(!player.advance_to(24));
        assert!(player.advance_to(GO_TILE));
        assert!(!player.advance_to(GO_TILE));
        assert_eq!(player.position, GO_TILE);
    }

    #[test]
    fn move_back_wraps_below_zero() {
        let mut player = PlayerState::new(0, 1500);
        player.position = 2;
        player.move_back(3);
        assert_eq!(player.position, 39);
    }

    #[test]
    fn jail_round_trip() {
        let mut player = PlayerState::new(1, 1500);
        player.send_to_jail();
        assert!(player.in_jail);
        assert_eq!(player.position, JAIL_TILE);
        player.jail_rolls = 2;
        player.release_from_jail();
        assert!(!player.in_jail);
        assert_eq!(player.jail_rolls, 0);
    }
}

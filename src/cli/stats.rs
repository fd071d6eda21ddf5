use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::board::{group_members, tile_spec};
use crate::game::{Game, GameEvent};
use crate::types::{Money, PlayerId, TileId};

#[derive(Debug, Default, Clone)]
pub struct GameStats {
    pub games: u32,
    pub wins: HashMap<PlayerId, u32>,
    /// Games stopped by the round limit.
    pub unfinished: u32,
    pub total_rounds: u64,
    pub total_duration: Duration,
    pub bankruptcies: u32,
    pub rent_by_tile: BTreeMap<TileId, Money>,
    /// Seat that completed a colour group first, per game.
    pub first_set_owner: HashMap<PlayerId, u32>,
    /// Games won by the seat that completed a group first.
    pub first_set_wins: u32,
}

impl GameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_game(&mut self, game: &Game, duration: Duration) {
        self.games += 1;
        self.total_duration += duration;
        self.total_rounds += game.state.round as u64;

        let winner = game.state.winner();
        match winner {
            Some(winner) => *self.wins.entry(winner).or_insert(0) += 1,
            None => self.unfinished += 1,
        }

        let mut owners: HashMap<TileId, PlayerId> = HashMap::new();
        let mut first_set = None;
        for event in game.state.log.iter() {
            match *event {
                GameEvent::Rent { tile, amount, .. } => {
                    *self.rent_by_tile.entry(tile).or_insert(0) += amount;
                }
                GameEvent::Bankrupt { .. } => self.bankruptcies += 1,
                GameEvent::ReceiveTitle { player, tile } | GameEvent::TradeTile { to: player, tile, .. } => {
                    owners.insert(tile, player);
                    if first_set.is_none() && completes_group(&owners, player, tile) {
                        first_set = Some(player);
                    }
                }
                _ => {}
            }
        }
        if let Some(player) = first_set {
            *self.first_set_owner.entry(player).or_insert(0) += 1;
            if winner == Some(player) {
                self.first_set_wins += 1;
            }
        }
    }

    pub fn merge(&mut self, other: GameStats) {
        self.games += other.games;
        self.unfinished += other.unfinished;
        self.total_rounds += other.total_rounds;
        self.total_duration += other.total_duration;
        self.bankruptcies += other.bankruptcies;
        self.first_set_wins += other.first_set_wins;
        for (player, wins) in other.wins {
            *self.wins.entry(player).or_insert(0) += wins;
        }
        for (player, count) in other.first_set_owner {
            *self.first_set_owner.entry(player).or_insert(0) += count;
        }
        for (tile, rent) in other.rent_by_tile {
            *self.rent_by_tile.entry(tile).or_insert(0) += rent;
        }
    }

    pub fn get_avg_rounds(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_rounds as f64 / self.games as f64
    }

    pub fn get_avg_duration(&self) -> Duration {
        if self.games == 0 {
            return Duration::ZERO;
        }
        self.total_duration / self.games
    }

    pub fn win_rate(&self, player: PlayerId) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.wins.get(&player).copied().unwrap_or(0) as f64 / self.games as f64 * 100.0
    }

    /// Tiles that collected the most rent, highest first.
    pub fn top_rent_tiles(&self, n: usize) -> Vec<(TileId, Money)> {
        let mut tiles: Vec<(TileId, Money)> =
            self.rent_by_tile.iter().map(|(t, r)| (*t, *r)).collect();
        tiles.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        tiles.truncate(n);
        tiles
    }
}

fn completes_group(owners: &HashMap<TileId, PlayerId>, player: PlayerId, tile: TileId) -> bool {
    tile_spec(tile).group.is_some_and(|group| {
        group_members(group)
            .iter()
            .all(|member| owners.get(member) == Some(&player))
    })
}

pub struct StatisticsAccumulator {
    pub stats: GameStats,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self {
            stats: GameStats::new(),
        }
    }

    pub fn after(&mut self, game: &Game, duration: Duration) {
        self.stats.record_game(game, duration);
    }
}

impl Default for StatisticsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::players::ScriptedPlayer;

    fn make_game() -> Game {
        Game::new(GameConfig {
            num_players: 2,
            ..GameConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn records_rent_and_first_set() {
        let mut game = make_game();
        let players = vec![ScriptedPlayer::default(), ScriptedPlayer::default()];
        game.state.assign_title(1, Some(1)).unwrap();
        game.state.assign_title(3, Some(1)).unwrap();
        game.play_turn_with_dice(&players, &[(1, 2)]).unwrap();

        let mut acc = StatisticsAccumulator::new();
        acc.after(&game, Duration::from_millis(5));
        let stats = &acc.stats;
        assert_eq!(stats.games, 1);
        assert_eq!(stats.unfinished, 1);
        assert_eq!(stats.rent_by_tile.get(&3), Some(&8));
        assert_eq!(stats.first_set_owner.get(&1), Some(&1));
        assert_eq!(stats.top_rent_tiles(3), vec![(3, 8)]);
    }

    #[test]
    fn merging_adds_up() {
        let mut a = GameStats::new();
        a.games = 2;
        a.wins.insert(0, 2);
        a.rent_by_tile.insert(39, 100);
        let mut b = GameStats::new();
        b.games = 1;
        b.wins.insert(0, 1);
        b.rent_by_tile.insert(39, 50);
        b.total_rounds = 30;
        a.merge(b);
        assert_eq!(a.games, 3);
        assert_eq!(a.wins[&0], 3);
        assert_eq!(a.rent_by_tile[&39], 150);
        assert_eq!(a.get_avg_rounds(), 10.0);
        assert_eq!(a.win_rate(0), 100.0);
    }
}

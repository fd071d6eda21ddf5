use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::types::{ColorGroup, Edition, Money, PlayerId, TileId, TileKind, TurnStamp};

pub mod cards;

pub const BOARD_SIZE: usize = 40;
pub const GO_TILE: TileId = 0;
pub const JAIL_TILE: TileId = 10;
pub const MAX_BUILDINGS: u8 = 5;

/// Immutable description of a board square.
#[derive(Debug, Clone)]
pub struct TileSpec {
    pub us_name: &'static str,
    pub uk_name: &'static str,
    pub kind: TileKind,
    pub cost: Money,
    pub rent: &'static [Money],
    pub group: Option<ColorGroup>,
    pub building_cost: Money,
}

impl TileSpec {
    const fn special(us_name: &'static str, uk_name: &'static str, kind: TileKind) -> Self {
        Self {
            us_name,
            uk_name,
            kind,
            cost: 0,
            rent: &[],
            group: None,
            building_cost: 0,
        }
    }

    const fn tax(us_name: &'static str, uk_name: &'static str, cost: Money) -> Self {
        Self {
            us_name,
            uk_name,
            kind: TileKind::Tax,
            cost,
            rent: &[],
            group: None,
            building_cost: 0,
        }
    }

    const fn property(
        us_name: &'static str,
        uk_name: &'static str,
        group: ColorGroup,
        cost: Money,
        building_cost: Money,
        rent: &'static [Money],
    ) -> Self {
        Self {
            us_name,
            uk_name,
            kind: TileKind::Property,
            cost,
            rent,
            group: Some(group),
            building_cost,
        }
    }

    const fn railroad(us_name: &'static str, uk_name: &'static str) -> Self {
        Self {
            us_name,
            uk_name,
            kind: TileKind::Railroad,
            cost: 200,
            rent: &[25, 50, 100, 200],
            group: None,
            building_cost: 0,
        }
    }

    const fn utility(us_name: &'static str, uk_name: &'static str) -> Self {
        Self {
            us_name,
            uk_name,
            kind: TileKind::Utility,
            cost: 150,
            rent: &[4, 10],
            group: None,
            building_cost: 0,
        }
    }

    pub fn name(&self, edition: Edition) -> &'static str {
        match edition {
            Edition::Us => self.us_name,
            Edition::Uk => self.uk_name,
        }
    }
}

static STANDARD_LAYOUT: Lazy<Vec<TileSpec>> = Lazy::new(|| {
    use ColorGroup::*;
    vec![
        TileSpec::special("Go", "Go", TileKind::Go),
        TileSpec::property("Mediterranean Avenue", "Old Kent Road", Brown, 60, 50, &[2, 10, 30, 90, 160, 250]),
        TileSpec::special("Community Chest", "Community Chest", TileKind::CommunityChest),
        TileSpec::property("Baltic Avenue", "Whitechapel Road", Brown, 60, 50, &[4, 20, 60, 180, 320, 450]),
        TileSpec::tax("Income Tax", "Income Tax", 200),
        TileSpec::railroad("Reading Railroad", "Kings Cross Station"),
        TileSpec::property("Oriental Avenue", "The Angel Islington", LightBlue, 100, 50, &[6, 30, 90, 270, 400, 550]),
        TileSpec::special("Chance", "Chance", TileKind::Chance),
        TileSpec::property("Vermont Avenue", "Euston Road", LightBlue, 100, 50, &[6, 30, 90, 270, 400, 550]),
        TileSpec::property("Connecticut Avenue", "Pentonville Road", LightBlue, 120, 50, &[8, 40, 100, 300, 450, 600]),
        TileSpec::special("Jail", "Jail", TileKind::Jail),
        TileSpec::property("St. Charles Place", "Pall Mall", Pink, 140, 100, &[10, 50, 150, 450, 625, 750]),
        TileSpec::utility("Electric Company", "Electric Company"),
        TileSpec::property("States Avenue", "Whitehall", Pink, 140, 100, &[10, 50, 150, 450, 625, 750]),
        TileSpec::property("Virginia Avenue", "Northumberland Avenue", Pink, 160, 100, &[12, 60, 180, 500, 700, 900]),
        TileSpec::railroad("Pennsylvania Railroad", "Marylebone Station"),
        TileSpec::property("St. James Place", "Bow Street", Orange, 180, 100, &[14, 70, 200, 550, 750, 950]),
        TileSpec::special("Community Chest", "Community Chest", TileKind::CommunityChest),
        TileSpec::property("Tennessee Avenue", "Marlborough Street", Orange, 180, 100, &[14, 70, 200, 550, 750, 950]),
        TileSpec::property("New York Avenue", "Vine Street", Orange, 200, 100, &[16, 80, 220, 600, 800, 1000]),
        TileSpec::special("Free Parking", "Free Parking", TileKind::FreeParking),
        TileSpec::property("Kentucky Avenue", "Strand", Red, 220, 150, &[18, 90, 250, 700, 875, 1050]),
        TileSpec::special("Chance", "Chance", TileKind::Chance),
        TileSpec::property("Indiana Avenue", "Fleet Street", Red, 220, 150, &[18, 90, 250, 700, 875, 1050]),
        TileSpec::property("Illinois Avenue", "Trafalgar Square", Red, 240, 150, &[20, 100, 300, 750, 925, 1100]),
        TileSpec::railroad("B. & O. Railroad", "Fenchurch St. Station"),
        TileSpec::property("Atlantic Avenue", "Leicester Square", Yellow, 260, 150, &[22, 110, 330, 800, 975, 1150]),
        TileSpec::property("Ventnor Avenue", "Coventry Street", Yellow, 260, 150, &[22, 110, 330, 800, 975, 1150]),
        TileSpec::utility("Water Works", "Water Works"),
        TileSpec::property("Marvin Gardens", "Piccadilly", Yellow, 280, 150, &[24, 120, 360, 850, 1025, 1200]),
        TileSpec::special("Go To Jail", "Go To Jail", TileKind::GoToJail),
        TileSpec::property("Pacific Avenue", "Regent Street", Green, 300, 200, &[26, 130, 390, 900, 1100, 1275]),
        TileSpec::property("North Carolina Avenue", "Oxford Street", Green, 300, 200, &[26, 130, 390, 900, 1100, 1275]),
        TileSpec::special("Community Chest", "Community Chest", TileKind::CommunityChest),
        TileSpec::property("Pennsylvania Avenue", "Bond Street", Green, 320, 200, &[28, 150, 450, 1000, 1200, 1400]),
        TileSpec::railroad("Short Line", "Liverpool St. Station"),
        TileSpec::special("Chance", "Chance", TileKind::Chance),
        TileSpec::property("Park Place", "Park Lane", DarkBlue, 350, 200, &[35, 175, 500, 1100, 1300, 1500]),
        TileSpec::tax("Luxury Tax", "Super Tax", 100),
        TileSpec::property("Boardwalk", "Mayfair", DarkBlue, 400, 200, &[50, 200, 600, 1400, 1700, 2000]),
    ]
});

static GROUP_MEMBERS: Lazy<HashMap<ColorGroup, Vec<TileId>>> = Lazy::new(|| {
    let mut groups: HashMap<ColorGroup, Vec<TileId>> = HashMap::new();
    for (index, spec) in STANDARD_LAYOUT.iter().enumerate() {
        if let Some(group) = spec.group {
            groups.entry(group).or_default().push(index);
        }
    }
    groups
});

pub fn tile_spec(tile: TileId) -> &'static TileSpec {
    &STANDARD_LAYOUT[tile % BOARD_SIZE]
}

pub fn group_members(group: ColorGroup) -> &'static [TileId] {
    GROUP_MEMBERS.get(&group).map(Vec::as_slice).unwrap_or(&[])
}

/// Mutable state of a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnableAsset {
    pub tile: TileId,
    pub owner: Option<PlayerId>,
    pub mortgaged: bool,
    pub buildings: u8,
    pub ownership_changed: TurnStamp,
}

impl OwnableAsset {
    fn new(tile: TileId) -> Self {
        Self {
            tile,
            owner: None,
            mortgaged: false,
            buildings: 0,
            ownership_changed: TurnStamp::default(),
        }
    }

    pub fn spec(&self) -> &'static TileSpec {
        tile_spec(self.tile)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    assets: Vec<Option<OwnableAsset>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl Board {
    pub fn standard() -> Self {
        let assets = STANDARD_LAYOUT
            .iter()
            .enumerate()
            .map(|(index, spec)| spec.kind.is_ownable().then(|| OwnableAsset::new(index)))
            .collect();
        Self { assets }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn asset(&self, tile: TileId) -> Option<&OwnableAsset> {
        self.assets.get(tile).and_then(Option::as_ref)
    }

    pub(crate) fn asset_mut(&mut self, tile: TileId) -> Option<&mut OwnableAsset> {
        self.assets.get_mut(tile).and_then(Option::as_mut)
    }

    pub fn assets(&self) -> impl Iterator<Item = &OwnableAsset> {
        self.assets.iter().flatten()
    }

    pub fn owner(&self, tile: TileId) -> Option<PlayerId> {
        self.asset(tile).and_then(|asset| asset.owner)
    }

    pub fn titles_of(&self, player: PlayerId) -> impl Iterator<Item = &OwnableAsset> {
        self.assets()
            .filter(move |asset| asset.owner == Some(player))
    }

    pub fn count_owned(&self, player: PlayerId, kind: TileKind) -> usize {
        self.titles_of(player)
            .filter(|asset| asset.spec().kind == kind)
            .count()
    }

    pub fn group_assets(&self, group: ColorGroup) -> impl Iterator<Item = &OwnableAsset> {
        group_members(group)
            .iter()
            .filter_map(|tile| self.asset(*tile))
    }

    /// The single owner of every tile in the group, if there is one.
    pub fn group_owner(&self, group: ColorGroup) -> Option<PlayerId> {
        let mut owners = self.group_assets(group).map(|asset| asset.owner);
        let first = owners.next()??;
        owners.all(|owner| owner == Some(first)).then_some(first)
    }

    pub fn owns_group(&self, player: PlayerId, group: ColorGroup) -> bool {
        self.group_owner(group) == Some(player)
    }

    pub fn completed_groups(&self, player: PlayerId) -> Vec<ColorGroup> {
        ColorGroup::ALL
            .into_iter()
            .filter(|group| self.owns_group(player, *group))
            .collect()
    }

    pub fn group_has_buildings(&self, group: ColorGroup) -> bool {
        self.group_assets(group).any(|asset| asset.buildings > 0)
    }

    pub fn group_has_mortgage(&self, group: ColorGroup) -> bool {
        self.group_assets(group).any(|asset| asset.mortgaged)
    }

    pub fn group_building_range(&self, group: ColorGroup) -> (u8, u8) {
        self.group_assets(group)
            .fold((MAX_BUILDINGS, 0), |(min, max), asset| {
                (min.min(asset.buildings), max.max(asset.buildings))
            })
    }

    /// Rent owed by `payer` landing on `tile` with dice total `roll`.
    pub fn rent(&self, tile: TileId, payer: PlayerId, roll: u8) -> Money {
        let Some(asset) = self.asset(tile) else {
            return 0;
        };
        let Some(owner) = asset.owner else {
            return 0;
        };
        if asset.mortgaged || owner == payer {
            return 0;
        }
        let spec = asset.spec();
        match spec.kind {
            TileKind::Property => {
                let base = spec.rent[asset.buildings as usize];
                let doubled = asset.buildings == 0
                    && spec.group.is_some_and(|group| self.owns_group(owner, group));
                if doubled { base * 2 } else { base }
            }
            TileKind::Railroad => {
                let owned = self.count_owned(owner, TileKind::Railroad).max(1);
                spec.rent[owned - 1]
            }
            TileKind::Utility => {
                let owned = self.count_owned(owner, TileKind::Utility).max(1);
                roll as Money * spec.rent[owned - 1]
            }
            _ => 0,
        }
    }

    /// Rent exposure used for cash reserves; an unowned tile counts its price when
    /// `count_unowned` is set.
    pub fn rent_exposure(&self, tile: TileId, payer: PlayerId, roll: u8, count_unowned: bool) -> Money {
        match self.asset(tile) {
            Some(asset) if asset.owner.is_none() => {
                if count_unowned { asset.spec().cost } else { 0 }
            }
            Some(_) => self.rent(tile, payer, roll),
            None => 0,
        }
    }

    /// Next tile of `kind` strictly after `from`, wrapping around the board.
    pub fn next_of_kind(&self, from: TileId, kind: TileKind) -> TileId {
        (1..=BOARD_SIZE)
            .map(|offset| (from + offset) % BOARD_SIZE)
            .find(|tile| tile_spec(*tile).kind == kind)
            .unwrap_or(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn give(board: &mut Board, tile: TileId, player: PlayerId) {
        if let Some(asset) = board.asset_mut(tile) {
            asset.owner = Some(player);
        }
    }

    #[test]
    fn standard_layout_has_expected_shape() {
        let board = Board::standard();
        assert_eq!(board.len(), BOARD_SIZE);
        assert_eq!(board.assets().count(), 28);
        assert_eq!(tile_spec(JAIL_TILE).kind, TileKind::Jail);
        assert_eq!(tile_spec(30).kind, TileKind::GoToJail);
        for group in ColorGroup::ALL {
            let size = group_members(group).len();
            assert!(size == 2 || size == 3, "{group} has {size} tiles");
        }
    }

    #[test]
    fn names_follow_edition() {
        assert_eq!(tile_spec(39).name(Edition::Us), "Boardwalk");
        assert_eq!(tile_spec(39).name(Edition::Uk), "Mayfair");
    }

    #[test]
    fn unimproved_complete_group_doubles_rent() {
        let mut board = Board::standard();
        give(&mut board, 1, 0);
        assert_eq!(board.rent(1, 1, 7), 2);
        give(&mut board, 3, 0);
        assert_eq!(board.rent(1, 1, 7), 4);
        board.asset_mut(1).unwrap().buildings = 1;
        assert_eq!(board.rent(1, 1, 7), 10);
        assert_eq!(board.rent(1, 0, 7), 0);
    }

    #[test]
    fn railroad_and_utility_rent_scale_with_count() {
        let mut board = Board::standard();
        give(&mut board, 5, 0);
        give(&mut board, 15, 0);
        assert_eq!(board.rent(5, 1, 7), 50);
        give(&mut board, 12, 2);
        assert_eq!(board.rent(12, 1, 8), 32);
        give(&mut board, 28, 2);
        assert_eq!(board.rent(12, 1, 8), 80);
    }

    #[test]
    fn mortgaged_tiles_collect_nothing() {
        let mut board = Board::standard();
        give(&mut board, 39, 0);
        board.asset_mut(39).unwrap().mortgaged = true;
        assert_eq!(board.rent(39, 1, 7), 0);
        assert_eq!(board.rent_exposure(37, 1, 7, true), 350);
        assert_eq!(board.rent_exposure(37, 1, 7, false), 0);
    }

    #[test]
    fn next_of_kind_wraps() {
        let board = Board::standard();
        assert_eq!(board.next_of_kind(36, TileKind::Railroad), 5);
        assert_eq!(board.next_of_kind(7, TileKind::Utility), 12);
        assert_eq!(board.next_of_kind(22, TileKind::Utility), 28);
    }
}

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub type Money = i64;
pub type TileId = usize;
pub type PlayerId = usize;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TileKind {
    Property,
    Railroad,
    Utility,
    Chance,
    CommunityChest,
    Tax,
    Go,
    Jail,
    FreeParking,
    GoToJail,
}

impl TileKind {
    pub fn is_ownable(self) -> bool {
        matches!(
            self,
            TileKind::Property | TileKind::Railroad | TileKind::Utility
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorGroup {
    Brown,
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    DarkBlue,
}

impl ColorGroup {
    pub const ALL: [ColorGroup; 8] = [
        ColorGroup::Brown,
        ColorGroup::LightBlue,
        ColorGroup::Pink,
        ColorGroup::Orange,
        ColorGroup::Red,
        ColorGroup::Yellow,
        ColorGroup::Green,
        ColorGroup::DarkBlue,
    ];
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Edition {
    Us,
    Uk,
}

impl Edition {
    pub fn currency(self) -> &'static str {
        match self {
            Edition::Us => "$",
            Edition::Uk => "£",
        }
    }
}

/// How a jailed player wants to leave jail before rolling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JailChoice {
    Card,
    Money,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeckKind {
    Chance,
    CommunityChest,
}

/// Round and turn index at which a title last changed hands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurnStamp {
    pub round: u32,
    pub turn: PlayerId,
}

pub(crate) fn scale(amount: Money, factor: f64) -> Money {
    (amount as f64 * factor).round() as Money
}

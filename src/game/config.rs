use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{Edition, Money};

/// A step of the liquidation cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquidationClass {
    SellJailCard,
    MortgageNonSetProperty,
    MortgageUtility,
    MortgageRailroad,
    MortgageSetProperty,
    SellUtility,
    SellRailroad,
    SellNonSetProperty,
    SellBuilding,
    SellSetProperty,
}

/// Tunables of the heuristic agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub liquidation_order: Vec<LiquidationClass>,
    pub sale_markups: Vec<f64>,
    pub swap_exponents: Vec<f64>,
    /// Highest exponent paid, and lowest asked, when not trailing the opponents.
    pub swap_cutoff: f64,
    pub cash_offer_factors: Vec<f64>,
    pub cash_offer_cutoff: f64,
    pub cash_offer_cutoff_behind: f64,
    /// Divisor applied to the expected rent exposure when sizing the cash reserve.
    pub risk: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        use LiquidationClass::*;
        Self {
            liquidation_order: vec![
                SellJailCard,
                MortgageNonSetProperty,
                MortgageUtility,
                MortgageRailroad,
                MortgageSetProperty,
                SellUtility,
                SellRailroad,
                SellNonSetProperty,
                SellBuilding,
                MortgageSetProperty,
                SellSetProperty,
            ],
            sale_markups: vec![3.5, 3.0, 2.5, 2.0, 1.5, 1.0],
            swap_exponents: vec![1.15, 1.2, 1.25, 1.3],
            swap_cutoff: 1.2,
            cash_offer_factors: vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5],
            cash_offer_cutoff: 3.0,
            cash_offer_cutoff_behind: 3.5,
            risk: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub num_players: usize,
    pub seed: u64,
    pub edition: Edition,
    pub starting_cash: Money,
    pub go_money: Money,
    pub jail_fine: Money,
    pub jail_card_value: Money,
    pub mortgage_multiplier: f64,
    pub unmortgage_multiplier: f64,
    pub late_unmortgage_multiplier: f64,
    pub demolish_multiplier: f64,
    pub auctions: bool,
    pub min_bid_increase: Money,
    pub max_rounds: u32,
    pub policy: PolicyConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: 4,
            seed: 42,
            edition: Edition::Us,
            starting_cash: 1500,
            go_money: 200,
            jail_fine: 50,
            jail_card_value: 50,
            mortgage_multiplier: 0.5,
            unmortgage_multiplier: 1.1,
            late_unmortgage_multiplier: 1.2,
            demolish_multiplier: 0.5,
            auctions: true,
            min_bid_increase: 1,
            max_rounds: 300,
            policy: PolicyConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl GameConfig {
    /// Load a configuration from a TOML file; missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=8).contains(&self.num_players) {
            return Err(ConfigError::Invalid("num_players must be between 2 and 8"));
        }
        if self.min_bid_increase < 1 {
            return Err(ConfigError::Invalid("min_bid_increase must be positive"));
        }
        if [self.starting_cash, self.go_money, self.jail_fine, self.jail_card_value]
            .iter()
            .any(|amount| *amount < 0)
        {
            return Err(ConfigError::Invalid("amounts must not be negative"));
        }
        let multipliers = [
            self.mortgage_multiplier,
            self.unmortgage_multiplier,
            self.late_unmortgage_multiplier,
            self.demolish_multiplier,
        ];
        if !multipliers.iter().all(|m| m.is_finite() && *m > 0.0) {
            return Err(ConfigError::Invalid("multipliers must be positive"));
        }
        if !(self.policy.risk.is_finite() && self.policy.risk > 0.0) {
            return Err(ConfigError::Invalid("policy.risk must be positive"));
        }
        if self.policy.sale_markups.is_empty() {
            return Err(ConfigError::Invalid("policy.sale_markups must not be empty"));
        }
        Ok(())
    }
}

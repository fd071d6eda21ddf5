pub mod auction;
pub mod liquidation;
pub mod negotiation;
pub mod valuation;

pub use auction::{Auction, AuctionPhase, run_auction};
pub use liquidation::{LiquidationAction, LiquidationPlan, raise};
pub use valuation::{Bundle, max_money, net_worth, reserve, usable_money, value};

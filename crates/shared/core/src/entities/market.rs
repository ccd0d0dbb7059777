use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CurveParameters, Team};
use crate::values::MarketId;

/// Point-in-time read of a market, fetched fresh every tick.
///
/// Shared read-only between all agents evaluating the market in a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStateSnapshot {
    pub market_id: MarketId,
    /// Outstanding supply of outcome A tokens
    pub team_a_supply: f64,
    /// Outstanding supply of outcome B tokens
    pub team_b_supply: f64,
    /// USDC held by the market pool
    pub pool_value: Decimal,
    pub curve: CurveParameters,
    pub halted: bool,
}

impl MarketStateSnapshot {
    /// Supply of the given outcome
    pub fn supply(&self, team: Team) -> f64 {
        match team {
            Team::A => self.team_a_supply,
            Team::B => self.team_b_supply,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ErrorKind, OrderSide, Team};
use crate::values::MarketId;

/// Aggregate holdings of an agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub usdc: f64,
    /// A tokens held across all markets
    pub tokens_a: f64,
    /// B tokens held across all markets
    pub tokens_b: f64,
}

/// Holdings in a single market
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub tokens_a: f64,
    pub tokens_b: f64,
    /// USDC cost basis of the A tokens still held
    pub cost_a: f64,
    /// USDC cost basis of the B tokens still held
    pub cost_b: f64,
}

impl Position {
    pub fn tokens(&self, team: Team) -> f64 {
        match team {
            Team::A => self.tokens_a,
            Team::B => self.tokens_b,
        }
    }

    /// USDC exposure (cost basis) on one side
    pub fn exposure(&self, team: Team) -> f64 {
        match team {
            Team::A => self.cost_a,
            Team::B => self.cost_b,
        }
    }

    pub fn total_exposure(&self) -> f64 {
        self.cost_a + self.cost_b
    }

    /// Average USDC paid per token still held
    pub fn average_entry(&self, team: Team) -> Option<f64> {
        let tokens = self.tokens(team);
        if tokens > 0.0 {
            Some(self.exposure(team) / tokens)
        } else {
            None
        }
    }

    pub fn is_flat(&self) -> bool {
        self.tokens_a <= 0.0 && self.tokens_b <= 0.0
    }
}

/// Most recent successful trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastTrade {
    pub market_id: MarketId,
    pub side: OrderSide,
    pub team: Team,
    /// Input amount (USDC for a buy, tokens for a sell)
    pub amount: f64,
    /// Output amount (tokens for a buy, USDC for a sell)
    pub realized: f64,
    pub tick: u64,
}

/// Ledger state of one agent. Owned by exactly one agent; mutated only
/// through its portfolio tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Orders submitted to the gateway
    pub trades_executed: u64,
    pub successful: u64,
    pub failed: u64,
    pub balances: Balances,
    pub initial_usdc: f64,
    pub usdc_spent: f64,
    pub usdc_received: f64,
    pub last_trade: Option<LastTrade>,
    pub positions: BTreeMap<MarketId, Position>,
    /// Error counts by kind, including errors that never reached the gateway
    pub errors: BTreeMap<ErrorKind, u64>,
}

impl PortfolioState {
    /// Fresh portfolio funded with `initial_usdc`
    pub fn new(initial_usdc: f64) -> Self {
        Self {
            balances: Balances {
                usdc: initial_usdc,
                ..Default::default()
            },
            initial_usdc,
            ..Default::default()
        }
    }

    /// Position in a market (flat if never traded)
    pub fn position(&self, market_id: &MarketId) -> Position {
        self.positions.get(market_id).copied().unwrap_or_default()
    }

    /// Tokens of `team` held in a market
    pub fn tokens(&self, market_id: &MarketId, team: Team) -> f64 {
        self.position(market_id).tokens(team)
    }

    /// USDC exposure on one side of a market
    pub fn exposure(&self, market_id: &MarketId, team: Team) -> f64 {
        self.position(market_id).exposure(team)
    }

    pub fn error_count(&self, kind: ErrorKind) -> u64 {
        self.errors.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }

    /// Last trade if it happened in the given market
    pub fn last_trade_in(&self, market_id: &MarketId) -> Option<&LastTrade> {
        self.last_trade
            .as_ref()
            .filter(|trade| &trade.market_id == market_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_portfolio_is_flat() {
        let state = PortfolioState::new(1_000.0);
        let market = MarketId::new("m1");

        assert_eq!(state.balances.usdc, 1_000.0);
        assert_eq!(state.tokens(&market, Team::A), 0.0);
        assert!(state.position(&market).is_flat());
        assert_eq!(state.total_errors(), 0);
    }

    #[test]
    fn test_average_entry() {
        let position = Position {
            tokens_a: 200.0,
            cost_a: 100.0,
            ..Default::default()
        };
        assert_eq!(position.average_entry(Team::A), Some(0.5));
        assert_eq!(position.average_entry(Team::B), None);
    }
}

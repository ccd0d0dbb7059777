use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ErrorKind, OrderSide, Team};

/// An agent's request to trade, emitted by `decide`.
///
/// `amount` is USDC in for a buy and tokens in for a sell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: OrderSide,
    pub team: Team,
    pub amount: f64,
    pub slippage_bps: u32,
}

impl OrderIntent {
    /// Spend `usdc` on `team` tokens
    pub fn buy(team: Team, usdc: f64, slippage_bps: u32) -> Self {
        Self {
            side: OrderSide::Buy,
            team,
            amount: usdc,
            slippage_bps,
        }
    }

    /// Sell `tokens` of `team`
    pub fn sell(team: Team, tokens: f64, slippage_bps: u32) -> Self {
        Self {
            side: OrderSide::Sell,
            team,
            amount: tokens,
            slippage_bps,
        }
    }
}

/// An intent together with its slippage bound.
///
/// `expected` and `min_acceptable` are in the output unit of the trade:
/// tokens for a buy, USDC for a sell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundedOrder {
    pub intent: OrderIntent,
    pub expected: f64,
    pub min_acceptable: f64,
}

/// Outcome of a submitted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Output actually received (tokens for a buy, USDC for a sell)
    pub realized_amount: Option<f64>,
    /// USDC that moved into (buy) or out of (sell) the pool
    pub usdc_amount: Option<Decimal>,
    pub error_kind: Option<ErrorKind>,
}

impl ExecutionResult {
    /// A filled order
    pub fn filled(realized_amount: f64, usdc_amount: Decimal) -> Self {
        Self {
            success: true,
            realized_amount: Some(realized_amount),
            usdc_amount: Some(usdc_amount),
            error_kind: None,
        }
    }

    /// A rejected order; nothing changed on the market
    pub fn rejected(kind: ErrorKind) -> Self {
        Self {
            success: false,
            realized_amount: None,
            usdc_amount: None,
            error_kind: Some(kind),
        }
    }
}

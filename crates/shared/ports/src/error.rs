use curvesim_core::MarketId;
use thiserror::Error;

/// Transport-level failures reported by a market gateway.
///
/// Business rejections (slippage, halted market, liquidity) are not errors
/// at this level; they come back as a failed `ExecutionResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Unknown market: {0}")]
    UnknownMarket(MarketId),

    #[error("Failed to read state of market {market_id}: {reason}")]
    StateFetch { market_id: MarketId, reason: String },

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

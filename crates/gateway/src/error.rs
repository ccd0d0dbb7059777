//! Error types for the gateway crate

use curvesim_core::{ErrorKind, MarketId};
use thiserror::Error;

/// Errors configuring the simulated market
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulatorError {
    #[error("Market {0} already exists")]
    DuplicateMarket(MarketId),

    #[error("Unknown market: {0}")]
    UnknownMarket(MarketId),

    #[error("Invalid market {market_id}: {reason}")]
    InvalidMarket { market_id: MarketId, reason: String },
}

impl SimulatorError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfiguration
    }
}

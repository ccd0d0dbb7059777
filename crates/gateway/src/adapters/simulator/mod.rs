//! Simulated bonding curve market
//!
//! Keeps every market in memory and settles orders against the curve.

mod book;
mod gateway;

pub use book::{MarketSetup, TradeRecord};
pub use gateway::SimulatedGateway;

//! Curvesim Gateway
//!
//! Gateway layer for the curvesim trading simulator. Provides:
//! - An in-memory adapter implementing the `MarketGateway` port
//! - Market setup records that configuration files deserialize into
//! - Fault injection for exercising failure paths
//!
//! ## Architecture
//!
//! ```text
//! TickScheduler
//!      │ fetch_market_state / submit_order(BoundedOrder)
//! ┌────▼──────────────┐
//! │ SimulatedGateway  │  per-market lock: check slippage, move supply and pool
//! └────┬──────────────┘
//!      │
//!  MarketBook (supply A/B, pool USDC, trade log)
//! ```
//!
//! The gateway is the only place the slippage bound is enforced. A fill
//! either happens completely at or above `min_acceptable`, or nothing on the
//! market changes.

pub mod adapters;
pub mod error;

// Re-export commonly used types
pub use adapters::simulator::{MarketSetup, SimulatedGateway, TradeRecord};
pub use error::SimulatorError;

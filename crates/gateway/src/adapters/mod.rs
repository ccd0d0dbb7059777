//! Market adapters
//!
//! Adapters implement the `MarketGateway` port on top of a concrete market.

pub mod simulator;

pub use simulator::SimulatedGateway;

//! Curvesim Core Domain
//!
//! Pure domain types for the curvesim bonding-curve trading simulator.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod reports;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Market state
    CurveParameters,
    MarketStateSnapshot,
    PriceHistory,
    // Orders and execution
    BoundedOrder,
    ErrorKind,
    ExecutionResult,
    OrderIntent,
    OrderSide,
    StrategyKind,
    Team,
    // Portfolio
    Balances,
    LastTrade,
    PortfolioState,
    Position,
};
pub use reports::{AgentMetrics, ReportEvent, RunReport, TickReport};
pub use values::{AgentId, MarketId, Timestamp, USDC_DECIMALS, quantize_usdc};

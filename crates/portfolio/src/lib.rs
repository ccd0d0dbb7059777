//! Curvesim Portfolio
//!
//! Per-agent ledger. Each agent slot owns one [`PortfolioTracker`] and feeds
//! it every submission attempt and execution result:
//!
//! ```text
//! decide ──► bound ──► submit ──► ExecutionResult ──► PortfolioTracker
//!                                                         │
//!                           snapshot() ◄──────────────────┘
//! ```
//!
//! Balances and positions change only on a successful result. Failures are
//! counted by error kind.

mod tracker;

pub use tracker::{MarkPrices, PortfolioTracker};

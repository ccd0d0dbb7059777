//! Curvesim Runner - Multi-Agent Bonding Curve Simulation
//!
//! Orchestrates the trading population against the market gateway:
//!
//! - **Config**: JSON description of markets, population and pacing
//! - **Bootstrap**: Opening markets and building funded, seeded agents
//! - **Scheduler**: Tick loop that evaluates, bounds, submits and aggregates
//! - **Report**: Sinks receiving periodic and final aggregates
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────────────┐
//!                  │     TickScheduler    │◄──── StopHandle
//!                  └──────────┬───────────┘
//!                             │ snapshot per market
//!                             ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         AGENT SLOTS                         │
//! │                                                             │
//! │  StrategyAgent::decide ──► OrderIntent ──► ExecutionGuard   │
//! │        ▲                                        │           │
//! │        │ on_execution        PortfolioTracker   │ bounded   │
//! └────────┼────────────────────────▲───────────────┼───────────┘
//!          │                        │ results       │ orders, grouped
//!          │                        │               ▼ by market + team
//!          │              ┌─────────┴─────────────────────┐
//!          └──────────────┤        MarketGateway          │
//!                         └───────────────────────────────┘
//!                             │ TickReport / RunReport
//!                             ▼
//!                        ReportSink(s)
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod report;
pub mod scheduler;

// Re-export main types
pub use bootstrap::{AgentSlot, SimulationBootstrap};
pub use config::{ConfigError, PopulationEntry, SimulationConfig};
pub use error::SchedulerError;
pub use report::{ChannelSink, LogSink, MemorySink};
pub use scheduler::{SchedulerSettings, SchedulerState, StopHandle, TickScheduler};

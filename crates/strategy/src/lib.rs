//! Curvesim Strategy Agents
//!
//! Decision functions for the simulated trading population:
//! - Strategy trait shared by every agent variant
//! - Six built-in behaviors behind the closed [`StrategyAgent`] enum
//! - Serde-tagged [`StrategyConfig`] that validates and builds agents
//!
//! ## Architecture
//!
//! ```text
//! MarketStateSnapshot ──┐
//!                       ├──► StrategyAgent::decide(.., rng) ──► Vec<OrderIntent>
//! PortfolioState ───────┘                                           │
//!                                                                   ▼
//!                     on_execution(result) ◄──────── gateway ◄── ExecutionGuard
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use curvesim_strategy::{Strategy, StrategyConfig};
//!
//! let mut agent = StrategyConfig::Momentum(Default::default()).build(engine)?;
//! let intents = agent.decide(&snapshot, &portfolio, &mut rng);
//! ```

pub mod agent;
pub mod arbitrageur;
pub mod config;
pub mod error;
pub mod intelligent_market_maker;
pub mod market_maker;
pub mod momentum;
pub mod retail;
pub mod strategy;
pub mod whale;

// Re-export main types
pub use agent::StrategyAgent;
pub use arbitrageur::{ArbitrageConfig, Arbitrageur, Opportunity};
pub use config::StrategyConfig;
pub use error::{StrategyConfigError, StrategyConfigResult};
pub use intelligent_market_maker::{
    IntelligentMarketMaker, IntelligentMarketMakerConfig, TrackingState,
};
pub use market_maker::{BasicMarketMaker, MarketMakerConfig};
pub use momentum::{MomentumConfig, MomentumTrader};
pub use retail::{RetailConfig, RetailTrader};
pub use strategy::{MIN_ORDER_TOKENS, MIN_ORDER_USDC, Strategy};
pub use whale::{WhaleConfig, WhaleMode, WhaleTrader};

use serde::{Deserialize, Serialize};

use crate::agent::StrategyAgent;
use crate::arbitrageur::{ArbitrageConfig, Arbitrageur};
use crate::error::StrategyConfigResult;
use crate::intelligent_market_maker::{IntelligentMarketMaker, IntelligentMarketMakerConfig};
use crate::market_maker::{BasicMarketMaker, MarketMakerConfig};
use crate::momentum::{MomentumConfig, MomentumTrader};
use crate::retail::{RetailConfig, RetailTrader};
use crate::whale::{WhaleConfig, WhaleTrader};
use curvesim_core::StrategyKind;
use curvesim_curve::CurvePricingEngine;

/// Strategy-specific parameters, tagged by strategy type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    MarketMaker(MarketMakerConfig),
    IntelligentMarketMaker(IntelligentMarketMakerConfig),
    Arbitrageur(ArbitrageConfig),
    Momentum(MomentumConfig),
    Whale(WhaleConfig),
    Retail(RetailConfig),
}

impl StrategyConfig {
    /// Default parameters for a strategy kind
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::MarketMaker => StrategyConfig::MarketMaker(Default::default()),
            StrategyKind::IntelligentMarketMaker => {
                StrategyConfig::IntelligentMarketMaker(Default::default())
            }
            StrategyKind::Arbitrageur => StrategyConfig::Arbitrageur(Default::default()),
            StrategyKind::Momentum => StrategyConfig::Momentum(Default::default()),
            StrategyKind::Whale => StrategyConfig::Whale(Default::default()),
            StrategyKind::Retail => StrategyConfig::Retail(Default::default()),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyConfig::MarketMaker(_) => StrategyKind::MarketMaker,
            StrategyConfig::IntelligentMarketMaker(_) => StrategyKind::IntelligentMarketMaker,
            StrategyConfig::Arbitrageur(_) => StrategyKind::Arbitrageur,
            StrategyConfig::Momentum(_) => StrategyKind::Momentum,
            StrategyConfig::Whale(_) => StrategyKind::Whale,
            StrategyConfig::Retail(_) => StrategyKind::Retail,
        }
    }

    /// Slippage tolerance every intent of this strategy carries
    pub fn slippage_bps(&self) -> u32 {
        match self {
            StrategyConfig::MarketMaker(c) => c.slippage_bps,
            StrategyConfig::IntelligentMarketMaker(c) => c.slippage_bps,
            StrategyConfig::Arbitrageur(c) => c.slippage_bps,
            StrategyConfig::Momentum(c) => c.slippage_bps,
            StrategyConfig::Whale(c) => c.slippage_bps,
            StrategyConfig::Retail(c) => c.slippage_bps,
        }
    }

    pub fn validate(&self) -> StrategyConfigResult<()> {
        match self {
            StrategyConfig::MarketMaker(c) => c.validate(),
            StrategyConfig::IntelligentMarketMaker(c) => c.validate(),
            StrategyConfig::Arbitrageur(c) => c.validate(),
            StrategyConfig::Momentum(c) => c.validate(),
            StrategyConfig::Whale(c) => c.validate(),
            StrategyConfig::Retail(c) => c.validate(),
        }?;
        crate::error::ensure(
            self.slippage_bps() <= curvesim_curve::MAX_SLIPPAGE_BPS,
            self.kind(),
            "slippage_bps must not exceed 10000",
        )
    }

    /// Validate and construct the agent
    pub fn build(&self, engine: CurvePricingEngine) -> StrategyConfigResult<StrategyAgent> {
        self.validate()?;
        let agent = match self.clone() {
            StrategyConfig::MarketMaker(c) => {
                StrategyAgent::MarketMaker(BasicMarketMaker::new(c, engine))
            }
            StrategyConfig::IntelligentMarketMaker(c) => {
                StrategyAgent::IntelligentMarketMaker(IntelligentMarketMaker::new(c, engine))
            }
            StrategyConfig::Arbitrageur(c) => StrategyAgent::Arbitrageur(Arbitrageur::new(c, engine)),
            StrategyConfig::Momentum(c) => StrategyAgent::Momentum(MomentumTrader::new(c, engine)),
            StrategyConfig::Whale(c) => StrategyAgent::Whale(WhaleTrader::new(c, engine)),
            StrategyConfig::Retail(c) => StrategyAgent::Retail(RetailTrader::new(c, engine)),
        };
        Ok(agent)
    }
}

use curvesim_core::{
    ExecutionResult, MarketId, MarketStateSnapshot, OrderIntent, PortfolioState, StrategyKind,
};
use rand::RngCore;

use crate::arbitrageur::Arbitrageur;
use crate::intelligent_market_maker::IntelligentMarketMaker;
use crate::market_maker::BasicMarketMaker;
use crate::momentum::MomentumTrader;
use crate::retail::RetailTrader;
use crate::strategy::Strategy;
use crate::whale::WhaleTrader;

/// Closed set of agent behaviors
pub enum StrategyAgent {
    MarketMaker(BasicMarketMaker),
    IntelligentMarketMaker(IntelligentMarketMaker),
    Arbitrageur(Arbitrageur),
    Momentum(MomentumTrader),
    Whale(WhaleTrader),
    Retail(RetailTrader),
}

impl StrategyAgent {
    fn inner(&self) -> &dyn Strategy {
        match self {
            StrategyAgent::MarketMaker(s) => s,
            StrategyAgent::IntelligentMarketMaker(s) => s,
            StrategyAgent::Arbitrageur(s) => s,
            StrategyAgent::Momentum(s) => s,
            StrategyAgent::Whale(s) => s,
            StrategyAgent::Retail(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Strategy {
        match self {
            StrategyAgent::MarketMaker(s) => s,
            StrategyAgent::IntelligentMarketMaker(s) => s,
            StrategyAgent::Arbitrageur(s) => s,
            StrategyAgent::Momentum(s) => s,
            StrategyAgent::Whale(s) => s,
            StrategyAgent::Retail(s) => s,
        }
    }
}

impl Strategy for StrategyAgent {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn kind(&self) -> StrategyKind {
        self.inner().kind()
    }

    fn decide(
        &mut self,
        market: &MarketStateSnapshot,
        portfolio: &PortfolioState,
        rng: &mut dyn RngCore,
    ) -> Vec<OrderIntent> {
        self.inner_mut().decide(market, portfolio, rng)
    }

    fn on_execution(&mut self, market_id: &MarketId, intent: &OrderIntent, result: &ExecutionResult) {
        self.inner_mut().on_execution(market_id, intent, result)
    }
}

impl std::fmt::Debug for StrategyAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StrategyAgent").field(&self.kind()).finish()
    }
}

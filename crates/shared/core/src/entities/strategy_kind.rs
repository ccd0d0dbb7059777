use serde::{Deserialize, Serialize};

/// Behavioral variant of a trading agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    MarketMaker,
    IntelligentMarketMaker,
    Arbitrageur,
    Momentum,
    Whale,
    Retail,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::MarketMaker,
        StrategyKind::IntelligentMarketMaker,
        StrategyKind::Arbitrageur,
        StrategyKind::Momentum,
        StrategyKind::Whale,
        StrategyKind::Retail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::MarketMaker => "market_maker",
            StrategyKind::IntelligentMarketMaker => "intelligent_market_maker",
            StrategyKind::Arbitrageur => "arbitrageur",
            StrategyKind::Momentum => "momentum",
            StrategyKind::Whale => "whale",
            StrategyKind::Retail => "retail",
        }
    }

    /// Liquidity providers are scheduled ahead of takers
    pub fn is_liquidity_provider(&self) -> bool {
        matches!(
            self,
            StrategyKind::MarketMaker | StrategyKind::IntelligentMarketMaker
        )
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

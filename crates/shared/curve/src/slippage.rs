use curvesim_core::StrategyKind;

/// Largest slippage tolerance an order may carry (100%)
pub const MAX_SLIPPAGE_BPS: u32 = 10_000;

/// Recommended slippage tolerance per strategy, in basis points
#[derive(Debug, Clone, Copy, Default)]
pub struct SlippagePolicy;

impl SlippagePolicy {
    pub fn recommended_bps(kind: StrategyKind) -> u32 {
        match kind {
            StrategyKind::MarketMaker => 50,
            StrategyKind::IntelligentMarketMaker => 50,
            StrategyKind::Arbitrageur => 10,
            StrategyKind::Retail => 100,
            StrategyKind::Momentum => 200,
            StrategyKind::Whale => 300,
        }
    }

    /// Fraction of the expected output an order accepts losing
    pub fn tolerance(bps: u32) -> f64 {
        f64::from(bps) / f64::from(MAX_SLIPPAGE_BPS)
    }
}

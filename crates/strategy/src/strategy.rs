//! Strategy Trait
//!
//! Every agent variant is a decision function over a fresh market snapshot
//! and the agent's own portfolio. Randomness is always injected by the
//! caller so runs are reproducible from a seed.

use curvesim_core::{
    ExecutionResult, MarketId, MarketStateSnapshot, OrderIntent, PortfolioState, StrategyKind, Team,
};
use rand::{Rng, RngCore};

/// Smallest USDC amount worth submitting
pub const MIN_ORDER_USDC: f64 = 0.01;

/// Smallest token amount worth submitting
pub const MIN_ORDER_TOKENS: f64 = 1e-6;

/// Strategy trait - implement this for each agent behavior
pub trait Strategy: Send {
    /// Strategy name for logging
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    fn kind(&self) -> StrategyKind;

    /// Decide what to trade on one market this tick
    fn decide(
        &mut self,
        market: &MarketStateSnapshot,
        portfolio: &PortfolioState,
        rng: &mut dyn RngCore,
    ) -> Vec<OrderIntent>;

    /// Called with the result of every submitted intent (optional)
    fn on_execution(
        &mut self,
        _market_id: &MarketId,
        _intent: &OrderIntent,
        _result: &ExecutionResult,
    ) {
    }
}

/// True with probability `p`
pub(crate) fn roll(rng: &mut dyn RngCore, p: f64) -> bool {
    if p.is_nan() {
        return false;
    }
    rng.gen_bool(p.clamp(0.0, 1.0))
}

/// Uniform draw from `[min, max]`
pub(crate) fn uniform(rng: &mut dyn RngCore, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// Buy intent if the amount is worth submitting
pub(crate) fn buy_if_sized(
    team: Team,
    usdc: f64,
    slippage_bps: u32,
) -> Option<OrderIntent> {
    (usdc.is_finite() && usdc >= MIN_ORDER_USDC)
        .then(|| OrderIntent::buy(team, usdc, slippage_bps))
}

/// Sell intent if the amount is worth submitting
pub(crate) fn sell_if_sized(
    team: Team,
    tokens: f64,
    slippage_bps: u32,
) -> Option<OrderIntent> {
    (tokens.is_finite() && tokens >= MIN_ORDER_TOKENS)
        .then(|| OrderIntent::sell(team, tokens, slippage_bps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curvesim_core::OrderSide;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_roll_edges() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(!roll(&mut rng, 0.0));
        assert!(roll(&mut rng, 1.0));
        assert!(roll(&mut rng, 3.0));
        assert!(!roll(&mut rng, f64::NAN));
    }

    #[test]
    fn test_uniform_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let x = uniform(&mut rng, 10.0, 50.0);
            assert!((10.0..=50.0).contains(&x));
        }
        assert_eq!(uniform(&mut rng, 5.0, 5.0), 5.0);
    }

    #[test]
    fn test_dust_orders_are_dropped() {
        assert!(buy_if_sized(Team::A, 0.001, 50).is_none());
        assert!(sell_if_sized(Team::B, 0.0, 50).is_none());
        let order = buy_if_sized(Team::A, 1.0, 50).unwrap();
        assert_eq!(order.side, OrderSide::Buy);
    }
}

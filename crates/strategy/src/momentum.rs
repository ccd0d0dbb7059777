//! Momentum Trader Agent
//!
//! Profits from trend continuation.
//!
//! Strategy:
//! - Track each side's spot price over a bounded window
//! - If a side is trending up strongly, buy it (bet the trend continues)
//! - If a side is trending down strongly, sell part of the position

use std::collections::HashMap;

use crate::error::{StrategyConfigResult, ensure};
use crate::strategy::{Strategy, buy_if_sized, sell_if_sized};
use curvesim_core::{
    MarketId, MarketStateSnapshot, OrderIntent, PortfolioState, PriceHistory, StrategyKind, Team,
};
use curvesim_curve::{CurvePricingEngine, SlippagePolicy};
use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Configuration for momentum trader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Samples kept per side
    pub window: usize,
    /// Samples needed before trading
    pub min_samples: usize,
    /// Relative move that triggers a trade
    pub threshold: f64,
    /// USDC size before scaling by momentum
    pub base_size: f64,
    /// Size and sell-fraction multiplier per unit of momentum
    pub multiplier: f64,
    /// Largest share of a position sold at once
    pub max_sell_fraction: f64,
    pub slippage_bps: u32,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            window: 10,
            min_samples: 5,
            threshold: 0.05,
            base_size: 20.0,
            multiplier: 2.0,
            max_sell_fraction: 0.8,
            slippage_bps: SlippagePolicy::recommended_bps(StrategyKind::Momentum),
        }
    }
}

impl MomentumConfig {
    pub fn validate(&self) -> StrategyConfigResult<()> {
        let kind = StrategyKind::Momentum;
        ensure(
            self.min_samples >= 2 && self.min_samples <= self.window,
            kind,
            "min_samples must be in [2, window]",
        )?;
        ensure(self.threshold > 0.0, kind, "threshold must be positive")?;
        ensure(
            self.base_size > 0.0 && self.multiplier >= 0.0,
            kind,
            "base_size must be positive and multiplier non-negative",
        )?;
        ensure(
            self.max_sell_fraction > 0.0 && self.max_sell_fraction <= 1.0,
            kind,
            "max_sell_fraction must be in (0, 1]",
        )
    }
}

/// Momentum trader agent
pub struct MomentumTrader {
    config: MomentumConfig,
    engine: CurvePricingEngine,
    histories: HashMap<MarketId, [PriceHistory; 2]>,
}

impl MomentumTrader {
    pub fn new(config: MomentumConfig, engine: CurvePricingEngine) -> Self {
        Self {
            config,
            engine,
            histories: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MomentumConfig {
        &self.config
    }

    /// Momentum signal of one side, once enough samples are in
    pub fn momentum(&self, market_id: &MarketId, team: Team) -> Option<f64> {
        let history = &self.histories.get(market_id)?[team_index(team)];
        if history.len() < self.config.min_samples {
            return None;
        }
        history.momentum()
    }
}

fn team_index(team: Team) -> usize {
    match team {
        Team::A => 0,
        Team::B => 1,
    }
}

impl Strategy for MomentumTrader {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Momentum
    }

    fn decide(
        &mut self,
        market: &MarketStateSnapshot,
        portfolio: &PortfolioState,
        _rng: &mut dyn RngCore,
    ) -> Vec<OrderIntent> {
        let market_id = &market.market_id;
        let window = self.config.window;
        let histories = self
            .histories
            .entry(market_id.clone())
            .or_insert_with(|| [PriceHistory::new(window), PriceHistory::new(window)]);
        for team in Team::ALL {
            histories[team_index(team)].push(self.engine.spot_price(market, team));
        }

        let config = &self.config;
        let mut available = portfolio.balances.usdc;
        let mut intents = Vec::new();

        for team in Team::ALL {
            let Some(momentum) = self.momentum(market_id, team) else {
                continue;
            };

            // Strong upward momentum - buy
            if momentum > config.threshold {
                let size = (config.base_size * (1.0 + momentum.abs() * config.multiplier))
                    .min(available);
                if let Some(intent) = buy_if_sized(team, size, config.slippage_bps) {
                    debug!(
                        "Momentum buy {} on {}: momentum {:.4}",
                        team, market_id, momentum
                    );
                    available -= size;
                    intents.push(intent);
                }
            }
            // Strong downward momentum - sell
            else if momentum < -config.threshold {
                let fraction = (momentum.abs() * config.multiplier).min(config.max_sell_fraction);
                let tokens = portfolio.tokens(market_id, team) * fraction;
                if let Some(intent) = sell_if_sized(team, tokens, config.slippage_bps) {
                    debug!(
                        "Momentum sell {} on {}: momentum {:.4}",
                        team, market_id, momentum
                    );
                    intents.push(intent);
                }
            }
        }

        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use curvesim_core::{CurveParameters, OrderSide, Position};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Price is 1.0 below 1000 supply and 1.2 from 1000 up
    fn market(supply_a: f64, supply_b: f64) -> MarketStateSnapshot {
        MarketStateSnapshot {
            market_id: MarketId::new("m1"),
            team_a_supply: supply_a,
            team_b_supply: supply_b,
            pool_value: Default::default(),
            curve: CurveParameters::linear_step(1.0, 0.2, 1_000.0),
            halted: false,
        }
    }

    fn short_window() -> MomentumConfig {
        MomentumConfig {
            window: 5,
            min_samples: 5,
            threshold: 0.05,
            ..Default::default()
        }
    }

    #[test]
    fn test_needs_history_first() {
        let mut trader = MomentumTrader::new(short_window(), CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(1);
        let portfolio = PortfolioState::new(1_000.0);

        for supply in [0.0, 0.0, 0.0, 1_000.0] {
            assert!(trader.decide(&market(supply, 0.0), &portfolio, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_buys_on_uptrend() {
        let mut trader = MomentumTrader::new(short_window(), CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(1);
        let portfolio = PortfolioState::new(1_000.0);

        // Prices [1, 1, 1, 1, 1.2]
        let mut intents = Vec::new();
        for supply in [0.0, 0.0, 0.0, 0.0, 1_000.0] {
            intents = trader.decide(&market(supply, 0.0), &portfolio, &mut rng);
        }

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].side, OrderSide::Buy);
        assert_eq!(intents[0].team, Team::A);
        assert_relative_eq!(intents[0].amount, 20.0 * 1.4, max_relative = 1e-9);
        assert_eq!(intents[0].slippage_bps, 200);
    }

    #[test]
    fn test_sells_on_downtrend() {
        let mut trader = MomentumTrader::new(short_window(), CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(1);
        let mut portfolio = PortfolioState::new(0.0);
        portfolio.positions.insert(
            MarketId::new("m1"),
            Position {
                tokens_b: 100.0,
                cost_b: 110.0,
                ..Default::default()
            },
        );

        // B prices [1.2, 1.2, 1.2, 1.2, 1.0]
        let mut intents = Vec::new();
        for supply in [1_000.0, 1_000.0, 1_000.0, 1_000.0, 0.0] {
            intents = trader.decide(&market(0.0, supply), &portfolio, &mut rng);
        }

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].side, OrderSide::Sell);
        assert_eq!(intents[0].team, Team::B);
        // |momentum| = 1/6, fraction = 1/3
        assert_relative_eq!(intents[0].amount, 100.0 / 3.0, max_relative = 1e-9);
    }

    #[test]
    fn test_flat_prices_do_nothing() {
        let mut trader = MomentumTrader::new(short_window(), CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(1);
        let portfolio = PortfolioState::new(1_000.0);

        for _ in 0..10 {
            assert!(
                trader
                    .decide(&market(500.0, 500.0), &portfolio, &mut rng)
                    .is_empty()
            );
        }
        assert_eq!(trader.momentum(&MarketId::new("m1"), Team::A), Some(0.0));
    }
}

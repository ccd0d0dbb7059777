//! Basic Exposure-Balancing Market Maker
//!
//! Keeps USDC exposure on both outcomes near a target:
//! - Below `max_position * rebalance_threshold` on a side, sometimes buys a
//!   random size on that side
//! - Above `max_position * overweight_factor`, sells part of that side

use crate::error::{StrategyConfigResult, ensure};
use crate::strategy::{Strategy, buy_if_sized, roll, sell_if_sized, uniform};
use curvesim_core::{MarketStateSnapshot, OrderIntent, PortfolioState, StrategyKind, Team};
use curvesim_curve::{CurvePricingEngine, SlippagePolicy};
use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Configuration for the market maker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketMakerConfig {
    /// Target USDC exposure per side
    pub max_position: f64,
    /// Fraction of `max_position` below which a side is topped up
    pub rebalance_threshold: f64,
    /// Chance of topping up an under-exposed side in a tick
    pub trade_probability: f64,
    pub min_trade: f64,
    pub max_trade: f64,
    /// Exposure multiple of `max_position` that triggers a sell
    pub overweight_factor: f64,
    /// Share of a side's tokens sold when overweight
    pub sell_fraction: f64,
    pub slippage_bps: u32,
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            max_position: 500.0,
            rebalance_threshold: 0.8,
            trade_probability: 0.3,
            min_trade: 10.0,
            max_trade: 50.0,
            overweight_factor: 1.2,
            sell_fraction: 0.2,
            slippage_bps: SlippagePolicy::recommended_bps(StrategyKind::MarketMaker),
        }
    }
}

impl MarketMakerConfig {
    pub fn validate(&self) -> StrategyConfigResult<()> {
        let kind = StrategyKind::MarketMaker;
        ensure(self.max_position > 0.0, kind, "max_position must be positive")?;
        ensure(
            (0.0..=1.0).contains(&self.rebalance_threshold),
            kind,
            "rebalance_threshold must be in [0, 1]",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.trade_probability),
            kind,
            "trade_probability must be in [0, 1]",
        )?;
        ensure(
            self.min_trade > 0.0 && self.max_trade >= self.min_trade,
            kind,
            "trade sizes must satisfy 0 < min_trade <= max_trade",
        )?;
        ensure(
            self.overweight_factor >= 1.0,
            kind,
            "overweight_factor must be at least 1",
        )?;
        ensure(
            self.sell_fraction > 0.0 && self.sell_fraction <= 1.0,
            kind,
            "sell_fraction must be in (0, 1]",
        )
    }
}

/// Basic exposure-balancing market maker
pub struct BasicMarketMaker {
    config: MarketMakerConfig,
    engine: CurvePricingEngine,
}

impl BasicMarketMaker {
    pub fn new(config: MarketMakerConfig, engine: CurvePricingEngine) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &MarketMakerConfig {
        &self.config
    }
}

impl Strategy for BasicMarketMaker {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MarketMaker
    }

    fn decide(
        &mut self,
        market: &MarketStateSnapshot,
        portfolio: &PortfolioState,
        rng: &mut dyn RngCore,
    ) -> Vec<OrderIntent> {
        let config = &self.config;
        let mut available = portfolio.balances.usdc;
        let mut intents = Vec::new();

        for team in Team::ALL {
            let exposure = portfolio.exposure(&market.market_id, team);

            if exposure < config.max_position * config.rebalance_threshold {
                if !roll(rng, config.trade_probability) {
                    continue;
                }
                let size = uniform(rng, config.min_trade, config.max_trade)
                    .min(available)
                    .min(config.max_position - exposure);
                if let Some(intent) = buy_if_sized(team, size, config.slippage_bps) {
                    available -= size;
                    intents.push(intent);
                }
            } else if exposure > config.max_position * config.overweight_factor {
                let tokens = portfolio.tokens(&market.market_id, team) * config.sell_fraction;
                debug!(
                    "MM overweight on {} {}: exposure {:.2}, selling {:.4} at {:.4}",
                    market.market_id,
                    team,
                    exposure,
                    tokens,
                    self.engine.spot_price(market, team)
                );
                intents.extend(sell_if_sized(team, tokens, config.slippage_bps));
            }
        }

        intents
    }
}

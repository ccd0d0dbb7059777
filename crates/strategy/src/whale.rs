//! Whale Trader Agent
//!
//! Rarely trades, but in size. The mode decides what a trade looks like:
//! - `value`: buy the cheaper side when the price gap is wide
//! - `pump`: several sequential buys on one side
//! - `dump`: sell most of the largest position
//! - `manipulate`: alternate direction based on its own last trade

use crate::error::{StrategyConfigResult, ensure};
use crate::strategy::{Strategy, buy_if_sized, roll, sell_if_sized, uniform};
use curvesim_core::{
    MarketStateSnapshot, OrderIntent, OrderSide, PortfolioState, StrategyKind, Team,
};
use curvesim_curve::{CurvePricingEngine, SlippagePolicy};
use log::debug;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhaleMode {
    #[default]
    Value,
    Pump,
    Dump,
    Manipulate,
}

/// Configuration for the whale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhaleConfig {
    pub mode: WhaleMode,
    /// Chance of trading in a tick
    pub trade_probability: f64,
    pub min_size: f64,
    pub max_size: f64,
    /// Relative price gap that makes the cheaper side worth buying
    pub value_gap_threshold: f64,
    /// Number of buys a pump is split into
    pub pump_orders: usize,
    /// Share of a position sold by a dump
    pub dump_fraction: f64,
    pub slippage_bps: u32,
}

impl Default for WhaleConfig {
    fn default() -> Self {
        Self {
            mode: WhaleMode::Value,
            trade_probability: 0.05,
            min_size: 200.0,
            max_size: 1_000.0,
            value_gap_threshold: 0.1,
            pump_orders: 3,
            dump_fraction: 0.8,
            slippage_bps: SlippagePolicy::recommended_bps(StrategyKind::Whale),
        }
    }
}

impl WhaleConfig {
    pub fn validate(&self) -> StrategyConfigResult<()> {
        let kind = StrategyKind::Whale;
        ensure(
            (0.0..=1.0).contains(&self.trade_probability),
            kind,
            "trade_probability must be in [0, 1]",
        )?;
        ensure(
            self.min_size > 0.0 && self.max_size >= self.min_size,
            kind,
            "sizes must satisfy 0 < min_size <= max_size",
        )?;
        ensure(self.pump_orders > 0, kind, "pump_orders must be positive")?;
        ensure(
            self.dump_fraction > 0.0 && self.dump_fraction <= 1.0,
            kind,
            "dump_fraction must be in (0, 1]",
        )
    }
}

/// Whale trader agent
pub struct WhaleTrader {
    config: WhaleConfig,
    engine: CurvePricingEngine,
}

impl WhaleTrader {
    pub fn new(config: WhaleConfig, engine: CurvePricingEngine) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &WhaleConfig {
        &self.config
    }

    fn random_team(rng: &mut dyn RngCore) -> Team {
        if rng.gen_bool(0.5) { Team::A } else { Team::B }
    }

    fn value_trade(&self, market: &MarketStateSnapshot, size: f64) -> Vec<OrderIntent> {
        let (price_a, price_b) = self.engine.spot_prices(market);
        let gap = (price_a - price_b).abs() / price_a.max(price_b);
        if gap <= self.config.value_gap_threshold {
            return Vec::new();
        }
        let team = if price_a < price_b { Team::A } else { Team::B };
        buy_if_sized(team, size, self.config.slippage_bps)
            .into_iter()
            .collect()
    }

    fn pump(&self, team: Team, size: f64) -> Vec<OrderIntent> {
        let orders = self.config.pump_orders;
        let slice = size / orders as f64;
        (0..orders)
            .filter_map(|_| buy_if_sized(team, slice, self.config.slippage_bps))
            .collect()
    }

    fn dump(&self, market: &MarketStateSnapshot, portfolio: &PortfolioState) -> Vec<OrderIntent> {
        let position = portfolio.position(&market.market_id);
        let team = if position.tokens_a >= position.tokens_b {
            Team::A
        } else {
            Team::B
        };
        let tokens = position.tokens(team) * self.config.dump_fraction;
        sell_if_sized(team, tokens, self.config.slippage_bps)
            .into_iter()
            .collect()
    }

    fn manipulate(
        &self,
        market: &MarketStateSnapshot,
        portfolio: &PortfolioState,
        size: f64,
        rng: &mut dyn RngCore,
    ) -> Vec<OrderIntent> {
        match portfolio.last_trade_in(&market.market_id) {
            Some(last) if last.side == OrderSide::Buy => {
                let tokens =
                    portfolio.tokens(&market.market_id, last.team) * self.config.dump_fraction;
                sell_if_sized(last.team, tokens, self.config.slippage_bps)
                    .into_iter()
                    .collect()
            }
            Some(last) => buy_if_sized(last.team, size, self.config.slippage_bps)
                .into_iter()
                .collect(),
            None => buy_if_sized(Self::random_team(rng), size, self.config.slippage_bps)
                .into_iter()
                .collect(),
        }
    }
}

impl Strategy for WhaleTrader {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Whale
    }

    fn decide(
        &mut self,
        market: &MarketStateSnapshot,
        portfolio: &PortfolioState,
        rng: &mut dyn RngCore,
    ) -> Vec<OrderIntent> {
        if !roll(rng, self.config.trade_probability) {
            return Vec::new();
        }

        let size = uniform(rng, self.config.min_size, self.config.max_size)
            .min(portfolio.balances.usdc);

        let intents = match self.config.mode {
            WhaleMode::Value => self.value_trade(market, size),
            WhaleMode::Pump => {
                let team = Self::random_team(rng);
                self.pump(team, size)
            }
            WhaleMode::Dump => self.dump(market, portfolio),
            WhaleMode::Manipulate => self.manipulate(market, portfolio, size, rng),
        };

        if !intents.is_empty() {
            debug!(
                "Whale ({:?}) on {}: {} orders",
                self.config.mode,
                market.market_id,
                intents.len()
            );
        }
        intents
    }
}

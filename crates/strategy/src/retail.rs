//! Retail Trader Agent
//!
//! Small, noisy participant:
//! - Trades on a fraction of ticks, picking a side at random with an
//!   optional bias toward a favorite team
//! - Sometimes doubles a buy out of FOMO
//! - Remembers its entry price per side and panic-sells when the price
//!   falls far enough below it

use std::collections::HashMap;

use crate::error::{StrategyConfigResult, ensure};
use crate::strategy::{Strategy, buy_if_sized, roll, sell_if_sized, uniform};
use curvesim_core::{
    ExecutionResult, MarketId, MarketStateSnapshot, OrderIntent, OrderSide, PortfolioState,
    StrategyKind, Team,
};
use curvesim_curve::{CurvePricingEngine, SlippagePolicy};
use log::debug;
use rand::RngCore;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Configuration for the retail trader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetailConfig {
    /// Chance of trading in a tick
    pub trade_frequency: f64,
    pub favorite_team: Option<Team>,
    /// Chance of picking the favorite team when one is set
    pub favorite_bias: f64,
    pub min_size: f64,
    pub max_size: f64,
    /// Chance of doubling a buy
    pub fomo_probability: f64,
    /// Chance of buying rather than selling when holding tokens
    pub buy_probability: f64,
    /// Price ratio to entry below which the trader panics
    pub panic_sell_threshold: f64,
    pub panic_sell_fraction: f64,
    pub min_sell_fraction: f64,
    pub max_sell_fraction: f64,
    pub slippage_bps: u32,
}

impl Default for RetailConfig {
    fn default() -> Self {
        Self {
            trade_frequency: 0.2,
            favorite_team: None,
            favorite_bias: 0.7,
            min_size: 5.0,
            max_size: 50.0,
            fomo_probability: 0.1,
            buy_probability: 0.6,
            panic_sell_threshold: 0.8,
            panic_sell_fraction: 0.8,
            min_sell_fraction: 0.1,
            max_sell_fraction: 0.6,
            slippage_bps: SlippagePolicy::recommended_bps(StrategyKind::Retail),
        }
    }
}

impl RetailConfig {
    pub fn validate(&self) -> StrategyConfigResult<()> {
        let kind = StrategyKind::Retail;
        for (name, p) in [
            ("trade_frequency", self.trade_frequency),
            ("favorite_bias", self.favorite_bias),
            ("fomo_probability", self.fomo_probability),
            ("buy_probability", self.buy_probability),
        ] {
            ensure(
                (0.0..=1.0).contains(&p),
                kind,
                &format!("{} must be in [0, 1]", name),
            )?;
        }
        ensure(
            self.min_size > 0.0 && self.max_size >= self.min_size,
            kind,
            "sizes must satisfy 0 < min_size <= max_size",
        )?;
        ensure(
            self.panic_sell_threshold > 0.0 && self.panic_sell_threshold < 1.0,
            kind,
            "panic_sell_threshold must be in (0, 1)",
        )?;
        ensure(
            self.panic_sell_fraction > 0.0 && self.panic_sell_fraction <= 1.0,
            kind,
            "panic_sell_fraction must be in (0, 1]",
        )?;
        ensure(
            self.min_sell_fraction > 0.0
                && self.min_sell_fraction <= self.max_sell_fraction
                && self.max_sell_fraction <= 1.0,
            kind,
            "sell fractions must satisfy 0 < min <= max <= 1",
        )
    }
}

/// Retail trader agent
pub struct RetailTrader {
    config: RetailConfig,
    engine: CurvePricingEngine,
    /// Entry price per market and side, blended with each new fill
    entry_prices: HashMap<(MarketId, Team), f64>,
}

impl RetailTrader {
    pub fn new(config: RetailConfig, engine: CurvePricingEngine) -> Self {
        Self {
            config,
            engine,
            entry_prices: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RetailConfig {
        &self.config
    }

    /// Entry price of a side, falling back to the portfolio's cost basis
    pub fn entry_price(
        &self,
        market_id: &MarketId,
        team: Team,
        portfolio: &PortfolioState,
    ) -> Option<f64> {
        self.entry_prices
            .get(&(market_id.clone(), team))
            .copied()
            .or_else(|| portfolio.position(market_id).average_entry(team))
    }

    fn pick_team(&self, rng: &mut dyn RngCore) -> Team {
        match self.config.favorite_team {
            Some(favorite) if roll(rng, self.config.favorite_bias) => favorite,
            Some(favorite) => favorite.opposite(),
            None if roll(rng, 0.5) => Team::A,
            None => Team::B,
        }
    }
}

impl Strategy for RetailTrader {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Retail
    }

    fn decide(
        &mut self,
        market: &MarketStateSnapshot,
        portfolio: &PortfolioState,
        rng: &mut dyn RngCore,
    ) -> Vec<OrderIntent> {
        let market_id = &market.market_id;
        self.entry_prices
            .retain(|(id, team), _| id != market_id || portfolio.tokens(id, *team) > 0.0);

        let config = &self.config;
        if !roll(rng, config.trade_frequency) {
            return Vec::new();
        }

        // A side below its panic level is dumped before any other choice
        let panic: Vec<OrderIntent> = Team::ALL
            .into_iter()
            .filter_map(|team| {
                let held = portfolio.tokens(market_id, team);
                let entry = self.entry_price(market_id, team, portfolio)?;
                let price = self.engine.spot_price(market, team);
                if held > 0.0 && price < entry * config.panic_sell_threshold {
                    debug!(
                        "Retail panic on {} {}: price {:.4} vs entry {:.4}",
                        market_id, team, price, entry
                    );
                    sell_if_sized(team, held * config.panic_sell_fraction, config.slippage_bps)
                } else {
                    None
                }
            })
            .collect();
        if !panic.is_empty() {
            return panic;
        }

        let team = self.pick_team(rng);
        let held = portfolio.tokens(market_id, team);

        if held > 0.0 && !roll(rng, config.buy_probability) {
            let fraction = uniform(rng, config.min_sell_fraction, config.max_sell_fraction);
            return sell_if_sized(team, held * fraction, config.slippage_bps)
                .into_iter()
                .collect();
        }

        let mut size = uniform(rng, config.min_size, config.max_size);
        if roll(rng, config.fomo_probability) {
            size *= 2.0;
        }
        buy_if_sized(team, size.min(portfolio.balances.usdc), config.slippage_bps)
            .into_iter()
            .collect()
    }

    fn on_execution(&mut self, market_id: &MarketId, intent: &OrderIntent, result: &ExecutionResult) {
        if !result.success || intent.side != OrderSide::Buy {
            return;
        }

        let tokens = result.realized_amount.unwrap_or(0.0);
        let usdc = result
            .usdc_amount
            .and_then(|usdc| usdc.to_f64())
            .unwrap_or(intent.amount);
        if tokens > 0.0 {
            let fill_price = usdc / tokens;
            self.entry_prices
                .entry((market_id.clone(), intent.team))
                .and_modify(|entry| *entry = (*entry + fill_price) / 2.0)
                .or_insert(fill_price);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curvesim_core::{CurveParameters, Position};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;

    fn market(supply_a: f64) -> MarketStateSnapshot {
        MarketStateSnapshot {
            market_id: MarketId::new("m1"),
            team_a_supply: supply_a,
            team_b_supply: 0.0,
            pool_value: Default::default(),
            curve: CurveParameters::linear_step(0.5, 0.1, 1_000.0),
            halted: false,
        }
    }

    fn holding_a(tokens: f64, cost: f64) -> PortfolioState {
        let mut portfolio = PortfolioState::new(100.0);
        portfolio.positions.insert(
            MarketId::new("m1"),
            Position {
                tokens_a: tokens,
                cost_a: cost,
                ..Default::default()
            },
        );
        portfolio
    }

    #[test]
    fn test_panic_sells_below_entry() {
        let config = RetailConfig {
            trade_frequency: 1.0,
            ..Default::default()
        };
        let mut trader = RetailTrader::new(config, CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(9);
        let portfolio = holding_a(100.0, 100.0);

        // Entry 1.0, price 0.5
        let intents = trader.decide(&market(0.0), &portfolio, &mut rng);

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].side, OrderSide::Sell);
        assert!((intents[0].amount - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_entry_price_from_fills() {
        let mut trader = RetailTrader::new(RetailConfig::default(), CurvePricingEngine::default());
        let market_id = MarketId::new("m1");
        let intent = OrderIntent::buy(Team::B, 10.0, 100);

        trader.on_execution(&market_id, &intent, &ExecutionResult::filled(20.0, dec!(10)));
        let portfolio = PortfolioState::new(0.0);
        assert_eq!(trader.entry_price(&market_id, Team::B, &portfolio), Some(0.5));

        trader.on_execution(
            &market_id,
            &intent,
            &ExecutionResult::rejected(curvesim_core::ErrorKind::SlippageExceeded),
        );
        assert_eq!(trader.entry_price(&market_id, Team::B, &portfolio), Some(0.5));
        assert_eq!(trader.entry_price(&market_id, Team::A, &portfolio), None);
    }

    #[test]
    fn test_favorite_bias() {
        let config = RetailConfig {
            trade_frequency: 1.0,
            favorite_team: Some(Team::B),
            fomo_probability: 0.0,
            ..Default::default()
        };
        let mut trader = RetailTrader::new(config, CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(10);
        let portfolio = PortfolioState::new(10_000.0);

        let mut on_b = 0;
        for _ in 0..1_000 {
            let intents = trader.decide(&market(0.0), &portfolio, &mut rng);
            assert_eq!(intents.len(), 1);
            assert!(intents[0].amount <= 50.0);
            if intents[0].team == Team::B {
                on_b += 1;
            }
        }
        assert!(on_b > 620 && on_b < 780, "favorite chosen {} times", on_b);
    }

    #[test]
    fn test_buys_capped_by_balance() {
        let config = RetailConfig {
            trade_frequency: 1.0,
            ..Default::default()
        };
        let mut trader = RetailTrader::new(config, CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(11);
        let portfolio = PortfolioState::new(3.0);

        for _ in 0..50 {
            for intent in trader.decide(&market(0.0), &portfolio, &mut rng) {
                assert!(intent.amount <= 3.0);
            }
        }
    }

    #[test]
    fn test_idle_trader_does_not_panic() {
        let config = RetailConfig {
            trade_frequency: 0.0,
            ..Default::default()
        };
        let mut trader = RetailTrader::new(config, CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(12);
        let portfolio = holding_a(100.0, 100.0);

        // Price 0.5 against entry 1.0, well under the panic level
        for _ in 0..20 {
            assert!(trader.decide(&market(0.0), &portfolio, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_fomo_doubles_buys() {
        let config = RetailConfig {
            trade_frequency: 1.0,
            fomo_probability: 1.0,
            ..Default::default()
        };
        let (min_size, max_size) = (config.min_size, config.max_size);
        let mut trader = RetailTrader::new(config, CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(13);
        let portfolio = PortfolioState::new(10_000.0);

        for _ in 0..200 {
            let intents = trader.decide(&market(0.0), &portfolio, &mut rng);
            assert_eq!(intents.len(), 1);
            assert_eq!(intents[0].side, OrderSide::Buy);
            let amount = intents[0].amount;
            assert!(
                amount >= 2.0 * min_size && amount <= 2.0 * max_size,
                "buy of {} outside doubled range",
                amount
            );
        }
    }

    #[test]
    fn test_sell_fraction_without_panic() {
        let config = RetailConfig {
            trade_frequency: 1.0,
            favorite_team: Some(Team::A),
            favorite_bias: 1.0,
            buy_probability: 0.0,
            ..Default::default()
        };
        let mut trader = RetailTrader::new(config, CurvePricingEngine::default());
        let mut rng = StdRng::seed_from_u64(14);
        // Entry 0.5 at price 0.5, above the panic level
        let portfolio = holding_a(100.0, 50.0);

        for _ in 0..200 {
            let intents = trader.decide(&market(0.0), &portfolio, &mut rng);
            assert_eq!(intents.len(), 1);
            assert_eq!(intents[0].side, OrderSide::Sell);
            assert_eq!(intents[0].team, Team::A);
            let amount = intents[0].amount;
            assert!(
                (10.0 - 1e-9..=60.0 + 1e-9).contains(&amount),
                "sold {} of 100 tokens",
                amount
            );
        }
    }
}

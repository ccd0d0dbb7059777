//! Arbitrageur Agent
//!
//! Reads each side's price as an implied probability (`1 / price`).
//!
//! Strategy:
//! - If the implied probabilities sum below `1 - min_profit_percent`, buy
//!   both sides, weighting each by the other side's probability
//! - Otherwise, if the prices diverge beyond a threshold and the sum is
//!   above the overround limit, bet on the cheaper side converging

use crate::error::{StrategyConfigResult, ensure};
use crate::strategy::{Strategy, buy_if_sized};
use curvesim_core::{MarketStateSnapshot, OrderIntent, PortfolioState, StrategyKind, Team};
use curvesim_curve::{CurvePricingEngine, SlippagePolicy, implied_probability};
use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Configuration for the arbitrageur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrageConfig {
    /// Required edge below a probability sum of 1
    pub min_profit_percent: f64,
    /// Largest USDC committed to one opportunity
    pub max_investment: f64,
    /// Share of available USDC committed to one opportunity
    pub investment_fraction: f64,
    /// Relative price gap that counts as divergence
    pub divergence_threshold: f64,
    /// Probability sum above which a convergence bet is considered
    pub overround_limit: f64,
    /// USDC size of a convergence bet
    pub convergence_size: f64,
    /// USDC exposure cap per side
    pub max_position: f64,
    pub slippage_bps: u32,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_profit_percent: 0.001,
            max_investment: 200.0,
            investment_fraction: 0.25,
            divergence_threshold: 0.15,
            overround_limit: 1.05,
            convergence_size: 40.0,
            max_position: 800.0,
            slippage_bps: SlippagePolicy::recommended_bps(StrategyKind::Arbitrageur),
        }
    }
}

impl ArbitrageConfig {
    pub fn validate(&self) -> StrategyConfigResult<()> {
        let kind = StrategyKind::Arbitrageur;
        ensure(
            (0.0..1.0).contains(&self.min_profit_percent),
            kind,
            "min_profit_percent must be in [0, 1)",
        )?;
        ensure(
            self.max_investment > 0.0 && self.convergence_size > 0.0,
            kind,
            "investment sizes must be positive",
        )?;
        ensure(
            self.investment_fraction > 0.0 && self.investment_fraction <= 1.0,
            kind,
            "investment_fraction must be in (0, 1]",
        )?;
        ensure(
            self.divergence_threshold >= 0.0,
            kind,
            "divergence_threshold must be non-negative",
        )?;
        ensure(self.max_position > 0.0, kind, "max_position must be positive")
    }
}

/// Trade the arbitrageur would take at a pair of prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Opportunity {
    /// Buy both sides; weights sum to one
    Guaranteed { weight_a: f64, weight_b: f64 },
    /// Buy the cheaper side
    Convergence { team: Team },
}

/// Arbitrageur agent
pub struct Arbitrageur {
    config: ArbitrageConfig,
    engine: CurvePricingEngine,
}

impl Arbitrageur {
    pub fn new(config: ArbitrageConfig, engine: CurvePricingEngine) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &ArbitrageConfig {
        &self.config
    }

    /// Classify a pair of prices
    pub fn evaluate(&self, price_a: f64, price_b: f64) -> Option<Opportunity> {
        if price_a <= 0.0 || price_b <= 0.0 {
            return None;
        }

        let implied_a = implied_probability(price_a);
        let implied_b = implied_probability(price_b);
        let sum = implied_a + implied_b;

        if sum < 1.0 - self.config.min_profit_percent {
            return Some(Opportunity::Guaranteed {
                weight_a: implied_b / sum,
                weight_b: implied_a / sum,
            });
        }

        let divergence = (price_a - price_b).abs() / price_a.min(price_b);
        if divergence > self.config.divergence_threshold && sum > self.config.overround_limit {
            let team = if price_a < price_b { Team::A } else { Team::B };
            return Some(Opportunity::Convergence { team });
        }

        None
    }
}

impl Strategy for Arbitrageur {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Arbitrageur
    }

    fn decide(
        &mut self,
        market: &MarketStateSnapshot,
        portfolio: &PortfolioState,
        _rng: &mut dyn RngCore,
    ) -> Vec<OrderIntent> {
        let config = &self.config;
        let (price_a, price_b) = self.engine.spot_prices(market);
        let available = portfolio.balances.usdc;
        let room = |team| config.max_position - portfolio.exposure(&market.market_id, team);

        match self.evaluate(price_a, price_b) {
            Some(Opportunity::Guaranteed { weight_a, weight_b }) => {
                let investment = config
                    .max_investment
                    .min(available * config.investment_fraction);
                debug!(
                    "Arb on {}: prices {:.4}/{:.4}, investing {:.2}",
                    market.market_id, price_a, price_b, investment
                );
                [(Team::A, weight_a), (Team::B, weight_b)]
                    .into_iter()
                    .filter_map(|(team, weight)| {
                        buy_if_sized(team, (investment * weight).min(room(team)), config.slippage_bps)
                    })
                    .collect()
            }
            Some(Opportunity::Convergence { team }) => {
                let size = config.convergence_size.min(available).min(room(team));
                debug!(
                    "Convergence bet on {} {}: prices {:.4}/{:.4}",
                    market.market_id, team, price_a, price_b
                );
                buy_if_sized(team, size, config.slippage_bps)
                    .into_iter()
                    .collect()
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use curvesim_core::{CurveParameters, MarketId, OrderSide};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn flat_market(price_a: f64, price_b: f64) -> MarketStateSnapshot {
        // One unit of B supply lifts B by exactly one step
        MarketStateSnapshot {
            market_id: MarketId::new("m1"),
            team_a_supply: 0.0,
            team_b_supply: if price_b > price_a { 1.0 } else { 0.0 },
            pool_value: Default::default(),
            curve: CurveParameters::linear_step(price_a, (price_b - price_a).max(0.0), 1.0),
            halted: false,
        }
    }

    fn arbitrageur() -> Arbitrageur {
        Arbitrageur::new(ArbitrageConfig::default(), CurvePricingEngine::default())
    }

    #[test]
    fn test_no_guaranteed_path_on_cheap_prices() {
        let arb = arbitrageur();

        assert_eq!(arb.evaluate(0.45, 0.45), None);
        assert!(!matches!(
            arb.evaluate(0.6, 0.55),
            Some(Opportunity::Guaranteed { .. })
        ));
    }

    #[test]
    fn test_guaranteed_path_below_one() {
        let arb = arbitrageur();

        match arb.evaluate(2.5, 2.5) {
            Some(Opportunity::Guaranteed { weight_a, weight_b }) => {
                assert_relative_eq!(weight_a, 0.5);
                assert_relative_eq!(weight_b, 0.5);
            }
            other => panic!("expected guaranteed path, got {:?}", other),
        }

    }

    #[test]
    fn test_guaranteed_path_edge() {
        let arb = arbitrageur();

        // Sum 0.998 clears the 0.999 line
        let price = 2.0 / 0.998;
        assert!(matches!(
            arb.evaluate(price, price),
            Some(Opportunity::Guaranteed { .. })
        ));

        // Sum 0.9995 does not
        let price = 2.0 / 0.9995;
        assert_eq!(arb.evaluate(price, price), None);
    }

    #[test]
    fn test_guaranteed_buys_both_sides() {
        let mut arb = arbitrageur();
        let mut rng = StdRng::seed_from_u64(5);
        let portfolio = PortfolioState::new(1_000.0);

        let intents = arb.decide(&flat_market(2.5, 2.5), &portfolio, &mut rng);

        assert_eq!(intents.len(), 2);
        assert!(intents.iter().all(|i| i.side == OrderSide::Buy));
        let total: f64 = intents.iter().map(|i| i.amount).sum();
        assert_relative_eq!(total, 200.0);
        assert_eq!(intents[0].slippage_bps, 10);
    }

    #[test]
    fn test_convergence_bet_on_cheaper_side() {
        let mut arb = arbitrageur();
        let mut rng = StdRng::seed_from_u64(5);
        let portfolio = PortfolioState::new(1_000.0);

        let intents = arb.decide(&flat_market(0.5, 0.8), &portfolio, &mut rng);

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].team, Team::A);
        assert_relative_eq!(intents[0].amount, 40.0);
    }

    #[test]
    fn test_no_trade_without_usdc() {
        let mut arb = arbitrageur();
        let mut rng = StdRng::seed_from_u64(5);
        let portfolio = PortfolioState::new(0.0);

        assert!(
            arb.decide(&flat_market(2.5, 2.5), &portfolio, &mut rng)
                .is_empty()
        );
    }
}

//! Intelligent Adaptive Market Maker
//!
//! Quotes against a fair value derived from the curve instead of topping up
//! exposure blindly:
//! - Tracks a bounded price history per side to estimate volatility and
//!   short/long moving-average momentum
//! - Fair value is the normalized implied probability of each side, shifted
//!   against momentum (mean reversion) and renormalized
//! - Trades a side only when its price deviates from fair value by more than
//!   a spread that widens with volatility, inventory imbalance and momentum
//! - Order size is scaled down by volatility, inventory skew and momentum
//! - `should_quote` refuses trades that deepen an overweight side, buy into
//!   a rally or sell into a crash

use std::collections::HashMap;

use crate::error::{StrategyConfigResult, ensure};
use crate::strategy::{Strategy, buy_if_sized, roll, sell_if_sized};
use curvesim_core::{
    MarketId, MarketStateSnapshot, OrderIntent, PortfolioState, PriceHistory, StrategyKind, Team,
};
use curvesim_curve::{CurvePricingEngine, SlippagePolicy, implied_probability};
use log::{debug, trace};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Bounds applied to each sizing factor
const SIZE_FACTOR_MIN: f64 = 0.3;
const SIZE_FACTOR_MAX: f64 = 1.5;

/// Floor for a side's fair probability before renormalizing
const MIN_FAIR_PROBABILITY: f64 = 0.01;

/// Configuration for the intelligent market maker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelligentMarketMakerConfig {
    /// Samples kept per side
    pub history_capacity: usize,
    pub short_window: usize,
    pub long_window: usize,
    /// Relative spread before widening
    pub base_spread: f64,
    pub min_spread: f64,
    pub max_spread: f64,
    /// USDC size before scaling
    pub base_size: f64,
    /// USDC exposure cap per side
    pub max_position: f64,
    /// Largest share of exposure above one half a side may reach
    pub max_inventory_deviation: f64,
    /// Momentum above which buying is refused
    pub momentum_buy_limit: f64,
    /// Momentum below which selling is refused
    pub crash_sell_limit: f64,
    /// Fair value shift per unit of momentum
    pub momentum_fair_value_weight: f64,
    /// Chance of acting on a deviation in a tick
    pub trade_probability: f64,
    pub slippage_bps: u32,
}

impl Default for IntelligentMarketMakerConfig {
    fn default() -> Self {
        Self {
            history_capacity: 20,
            short_window: 5,
            long_window: 10,
            base_spread: 0.02,
            min_spread: 0.005,
            max_spread: 0.15,
            base_size: 30.0,
            max_position: 600.0,
            max_inventory_deviation: 0.3,
            momentum_buy_limit: 0.05,
            crash_sell_limit: -0.05,
            momentum_fair_value_weight: 0.05,
            trade_probability: 0.6,
            slippage_bps: SlippagePolicy::recommended_bps(StrategyKind::IntelligentMarketMaker),
        }
    }
}

impl IntelligentMarketMakerConfig {
    pub fn validate(&self) -> StrategyConfigResult<()> {
        let kind = StrategyKind::IntelligentMarketMaker;
        ensure(
            self.short_window > 0 && self.short_window < self.long_window,
            kind,
            "windows must satisfy 0 < short_window < long_window",
        )?;
        ensure(
            self.history_capacity >= self.long_window,
            kind,
            "history_capacity must hold the long window",
        )?;
        ensure(
            self.min_spread >= 0.0 && self.min_spread <= self.max_spread,
            kind,
            "spreads must satisfy 0 <= min_spread <= max_spread",
        )?;
        ensure(self.base_spread > 0.0, kind, "base_spread must be positive")?;
        ensure(
            self.base_size > 0.0 && self.max_position > 0.0,
            kind,
            "base_size and max_position must be positive",
        )?;
        ensure(
            (0.0..=0.5).contains(&self.max_inventory_deviation),
            kind,
            "max_inventory_deviation must be in [0, 0.5]",
        )?;
        ensure(
            self.crash_sell_limit <= 0.0 && self.momentum_buy_limit >= 0.0,
            kind,
            "momentum limits must straddle zero",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.trade_probability),
            kind,
            "trade_probability must be in [0, 1]",
        )
    }

    /// Spread widened by volatility, imbalance and momentum, clamped to
    /// `[min_spread, max_spread]`
    pub fn dynamic_spread(&self, tracking: &TrackingState) -> f64 {
        let spread = self.base_spread
            * (1.0 + 10.0 * tracking.average_volatility())
            * (1.0 + 2.0 * (tracking.imbalance_ratio - 0.5).abs())
            * (1.0 + 3.0 * tracking.max_momentum_magnitude());
        spread.clamp(self.min_spread, self.max_spread)
    }

    /// Whether a trade on `team` is allowed given current tracking state
    pub fn should_quote(&self, tracking: &TrackingState, team: Team, is_buy: bool) -> bool {
        let momentum = tracking.momentum(team);
        if is_buy {
            if tracking.share(team) - 0.5 > self.max_inventory_deviation {
                return false;
            }
            momentum <= self.momentum_buy_limit
        } else {
            momentum >= self.crash_sell_limit
        }
    }

    /// USDC size for a trade on `team`
    pub fn order_size(&self, tracking: &TrackingState, team: Team, is_buy: bool) -> f64 {
        let volatility_damp = 1.0 / (1.0 + 10.0 * tracking.volatility(team));
        let skew = if is_buy {
            1.0 + 2.0 * (0.5 - tracking.share(team))
        } else {
            1.0 + 2.0 * (tracking.share(team) - 0.5)
        };
        let momentum_fade = 1.0 - 5.0 * tracking.momentum(team).abs();

        self.base_size
            * volatility_damp.clamp(SIZE_FACTOR_MIN, SIZE_FACTOR_MAX)
            * skew.clamp(SIZE_FACTOR_MIN, SIZE_FACTOR_MAX)
            * momentum_fade.clamp(SIZE_FACTOR_MIN, SIZE_FACTOR_MAX)
    }

    /// Fair probabilities `(A, B)` from spot prices and momentum
    pub fn fair_value(&self, price_a: f64, price_b: f64, tracking: &TrackingState) -> (f64, f64) {
        let (prob_a, prob_b) = normalized_probabilities(price_a, price_b);
        let weight = self.momentum_fair_value_weight;
        let fair_a = (prob_a - tracking.momentum_a * weight).max(MIN_FAIR_PROBABILITY);
        let fair_b = (prob_b - tracking.momentum_b * weight).max(MIN_FAIR_PROBABILITY);
        let total = fair_a + fair_b;
        (fair_a / total, fair_b / total)
    }
}

/// Implied probabilities scaled to sum to one
fn normalized_probabilities(price_a: f64, price_b: f64) -> (f64, f64) {
    let implied_a = implied_probability(price_a);
    let implied_b = implied_probability(price_b);
    let total = implied_a + implied_b;
    if total > 0.0 {
        (implied_a / total, implied_b / total)
    } else {
        (0.5, 0.5)
    }
}

/// Per-market observations of the intelligent market maker
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingState {
    pub history_a: PriceHistory,
    pub history_b: PriceHistory,
    /// Share of USDC exposure on side A (0.5 when flat)
    pub imbalance_ratio: f64,
    pub momentum_a: f64,
    pub momentum_b: f64,
    pub volatility_a: f64,
    pub volatility_b: f64,
}

impl TrackingState {
    pub fn new(capacity: usize) -> Self {
        Self {
            history_a: PriceHistory::new(capacity),
            history_b: PriceHistory::new(capacity),
            imbalance_ratio: 0.5,
            momentum_a: 0.0,
            momentum_b: 0.0,
            volatility_a: 0.0,
            volatility_b: 0.0,
        }
    }

    /// Record spot prices and refresh the derived signals
    pub fn observe(&mut self, price_a: f64, price_b: f64, short: usize, long: usize) {
        self.history_a.push(price_a);
        self.history_b.push(price_b);
        self.volatility_a = self.history_a.volatility();
        self.volatility_b = self.history_b.volatility();
        self.momentum_a = ma_momentum(&self.history_a, short, long);
        self.momentum_b = ma_momentum(&self.history_b, short, long);
    }

    /// Refresh the exposure split
    pub fn update_imbalance(&mut self, exposure_a: f64, exposure_b: f64) {
        let total = exposure_a + exposure_b;
        self.imbalance_ratio = if total > 0.0 {
            exposure_a / total
        } else {
            0.5
        };
    }

    /// Share of exposure held on `team`
    pub fn share(&self, team: Team) -> f64 {
        match team {
            Team::A => self.imbalance_ratio,
            Team::B => 1.0 - self.imbalance_ratio,
        }
    }

    pub fn momentum(&self, team: Team) -> f64 {
        match team {
            Team::A => self.momentum_a,
            Team::B => self.momentum_b,
        }
    }

    pub fn volatility(&self, team: Team) -> f64 {
        match team {
            Team::A => self.volatility_a,
            Team::B => self.volatility_b,
        }
    }

    pub fn average_volatility(&self) -> f64 {
        (self.volatility_a + self.volatility_b) / 2.0
    }

    pub fn max_momentum_magnitude(&self) -> f64 {
        self.momentum_a.abs().max(self.momentum_b.abs())
    }
}

/// `(shortMA - longMA) / longMA`, zero until the long window is filled
fn ma_momentum(history: &PriceHistory, short: usize, long: usize) -> f64 {
    match (history.moving_average(short), history.moving_average(long)) {
        (Some(short_ma), Some(long_ma)) if long_ma > 0.0 => (short_ma - long_ma) / long_ma,
        _ => 0.0,
    }
}

/// Intelligent adaptive market maker
pub struct IntelligentMarketMaker {
    config: IntelligentMarketMakerConfig,
    engine: CurvePricingEngine,
    tracking: HashMap<MarketId, TrackingState>,
}

impl IntelligentMarketMaker {
    pub fn new(config: IntelligentMarketMakerConfig, engine: CurvePricingEngine) -> Self {
        Self {
            config,
            engine,
            tracking: HashMap::new(),
        }
    }

    pub fn config(&self) -> &IntelligentMarketMakerConfig {
        &self.config
    }

    /// Tracking state of a market, if it has been observed
    pub fn tracking(&self, market_id: &MarketId) -> Option<&TrackingState> {
        self.tracking.get(market_id)
    }

    pub fn should_quote(&self, tracking: &TrackingState, team: Team, is_buy: bool) -> bool {
        self.config.should_quote(tracking, team, is_buy)
    }
}

impl Strategy for IntelligentMarketMaker {
    fn kind(&self) -> StrategyKind {
        StrategyKind::IntelligentMarketMaker
    }

    fn decide(
        &mut self,
        market: &MarketStateSnapshot,
        portfolio: &PortfolioState,
        rng: &mut dyn RngCore,
    ) -> Vec<OrderIntent> {
        let config = &self.config;
        let (price_a, price_b) = self.engine.spot_prices(market);
        let market_id = &market.market_id;

        let tracking = self
            .tracking
            .entry(market_id.clone())
            .or_insert_with(|| TrackingState::new(config.history_capacity));
        tracking.observe(price_a, price_b, config.short_window, config.long_window);
        tracking.update_imbalance(
            portfolio.exposure(market_id, Team::A),
            portfolio.exposure(market_id, Team::B),
        );

        let spread = config.dynamic_spread(tracking);
        let (fair_a, fair_b) = config.fair_value(price_a, price_b, tracking);
        let pair_total = price_a + price_b;

        trace!(
            "IMM {} prices {:.4}/{:.4} fair {:.4}/{:.4} spread {:.4}",
            market_id, price_a, price_b, fair_a, fair_b, spread
        );

        if !roll(rng, config.trade_probability) {
            return Vec::new();
        }

        let mut available = portfolio.balances.usdc;
        let mut intents = Vec::new();

        for (team, price, fair) in [(Team::A, price_a, fair_a), (Team::B, price_b, fair_b)] {
            if price <= 0.0 {
                continue;
            }
            let fair_price = fair * pair_total;
            let deviation = (fair_price - price) / price;

            if deviation > spread && config.should_quote(tracking, team, true) {
                let room = config.max_position - portfolio.exposure(market_id, team);
                let size = config
                    .order_size(tracking, team, true)
                    .min(available)
                    .min(room);
                if let Some(intent) = buy_if_sized(team, size, config.slippage_bps) {
                    debug!(
                        "IMM buying {} on {}: deviation {:.4} > spread {:.4}",
                        team, market_id, deviation, spread
                    );
                    available -= size;
                    intents.push(intent);
                }
            } else if deviation < -spread && config.should_quote(tracking, team, false) {
                let held = portfolio.tokens(market_id, team);
                let tokens = (config.order_size(tracking, team, false) / price).min(held);
                if let Some(intent) = sell_if_sized(team, tokens, config.slippage_bps) {
                    debug!(
                        "IMM selling {} on {}: deviation {:.4} < -{:.4}",
                        team, market_id, deviation, spread
                    );
                    intents.push(intent);
                }
            }
        }

        intents
    }
}

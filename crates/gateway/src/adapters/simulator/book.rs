//! Per-market ledger of the simulated gateway

use curvesim_core::{
    BoundedOrder, CurveParameters, ErrorKind, ExecutionResult, MarketId, MarketStateSnapshot,
    OrderSide, Team, USDC_DECIMALS,
};
use curvesim_curve::{CurveError, CurvePricingEngine, floor_to_micro};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Initial state of a market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSetup {
    pub id: MarketId,
    #[serde(default)]
    pub curve: CurveParameters,
    #[serde(default)]
    pub team_a_supply: f64,
    #[serde(default)]
    pub team_b_supply: f64,
    /// USDC held by the pool at start
    #[serde(default)]
    pub pool_value: Decimal,
    #[serde(default)]
    pub halted: bool,
}

impl MarketSetup {
    /// Market with the given curve, no supply and an empty pool
    pub fn new(id: impl Into<MarketId>, curve: CurveParameters) -> Self {
        Self {
            id: id.into(),
            curve,
            team_a_supply: 0.0,
            team_b_supply: 0.0,
            pool_value: Decimal::ZERO,
            halted: false,
        }
    }

    pub fn with_supplies(mut self, team_a: f64, team_b: f64) -> Self {
        self.team_a_supply = team_a;
        self.team_b_supply = team_b;
        self
    }

    pub fn with_pool(mut self, pool_value: Decimal) -> Self {
        self.pool_value = pool_value;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        CurvePricingEngine::validate(&self.curve).map_err(|e| e.to_string())?;
        for supply in [self.team_a_supply, self.team_b_supply] {
            if !supply.is_finite() || supply < 0.0 {
                return Err(format!("supply must be non-negative, got {}", supply));
            }
        }
        if self.pool_value.is_sign_negative() {
            return Err(format!("pool must be non-negative, got {}", self.pool_value));
        }
        Ok(())
    }
}

/// A settled trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: Uuid,
    pub market_id: MarketId,
    pub side: OrderSide,
    pub team: Team,
    /// USDC into the pool for a buy, out of the pool for a sell
    pub usdc: Decimal,
    pub tokens: f64,
    pub supply_after: f64,
    pub pool_after: Decimal,
}

/// Live state of one market
#[derive(Debug)]
pub(crate) struct MarketBook {
    pub market_id: MarketId,
    pub curve: CurveParameters,
    pub team_a_supply: f64,
    pub team_b_supply: f64,
    pub pool_value: Decimal,
    pub initial_pool: Decimal,
    pub halted: bool,
    pub trades: Vec<TradeRecord>,
    /// Upcoming state fetches that will fail
    pub failing_fetches: u32,
    /// Upcoming submissions that will fail in transport
    pub failing_submissions: u32,
}

impl MarketBook {
    pub fn new(setup: MarketSetup) -> Self {
        Self {
            market_id: setup.id,
            curve: setup.curve,
            team_a_supply: setup.team_a_supply,
            team_b_supply: setup.team_b_supply,
            pool_value: setup.pool_value,
            initial_pool: setup.pool_value,
            halted: setup.halted,
            trades: Vec::new(),
            failing_fetches: 0,
            failing_submissions: 0,
        }
    }

    pub fn snapshot(&self) -> MarketStateSnapshot {
        MarketStateSnapshot {
            market_id: self.market_id.clone(),
            team_a_supply: self.team_a_supply,
            team_b_supply: self.team_b_supply,
            pool_value: self.pool_value,
            curve: self.curve,
            halted: self.halted,
        }
    }

    fn supply(&self, team: Team) -> f64 {
        match team {
            Team::A => self.team_a_supply,
            Team::B => self.team_b_supply,
        }
    }

    fn set_supply(&mut self, team: Team, supply: f64) {
        match team {
            Team::A => self.team_a_supply = supply,
            Team::B => self.team_b_supply = supply,
        }
    }

    /// Settle an order completely or not at all
    pub fn execute(&mut self, engine: &CurvePricingEngine, order: &BoundedOrder) -> ExecutionResult {
        if self.halted {
            return ExecutionResult::rejected(ErrorKind::MarketHalted);
        }

        let result = match order.intent.side {
            OrderSide::Buy => self.execute_buy(engine, order),
            OrderSide::Sell => self.execute_sell(engine, order),
        };

        match result {
            Ok(result) => result,
            Err(e) => {
                warn!("Order on {} failed to price: {}", self.market_id, e);
                let kind = match e {
                    CurveError::InsufficientSupply { .. } => ErrorKind::InsufficientBalance,
                    _ => ErrorKind::SubmissionFailure,
                };
                ExecutionResult::rejected(kind)
            }
        }
    }

    fn execute_buy(
        &mut self,
        engine: &CurvePricingEngine,
        order: &BoundedOrder,
    ) -> Result<ExecutionResult, CurveError> {
        let team = order.intent.team;
        let usdc = floor_to_micro(order.intent.amount);
        let Some(usdc_in) = to_micro_decimal(usdc).filter(|d| d.is_sign_positive() && !d.is_zero())
        else {
            return Err(CurveError::InvalidAmount(order.intent.amount));
        };

        let supply = self.supply(team);
        let tokens = engine.tokens_out(usdc, supply, &self.curve)?;
        if tokens < order.min_acceptable {
            debug!(
                "Buy {} on {} rejected: {:.6} tokens < min {:.6}",
                team, self.market_id, tokens, order.min_acceptable
            );
            return Ok(ExecutionResult::rejected(ErrorKind::SlippageExceeded));
        }

        self.set_supply(team, supply + tokens);
        self.pool_value += usdc_in;
        self.record(OrderSide::Buy, team, usdc_in, tokens);

        Ok(ExecutionResult::filled(tokens, usdc_in))
    }

    fn execute_sell(
        &mut self,
        engine: &CurvePricingEngine,
        order: &BoundedOrder,
    ) -> Result<ExecutionResult, CurveError> {
        let team = order.intent.team;
        let tokens = order.intent.amount;
        if !tokens.is_finite() || tokens <= 0.0 {
            return Err(CurveError::InvalidAmount(tokens));
        }
        let supply = self.supply(team);

        let payout = floor_to_micro(engine.usdc_out(tokens, supply, &self.curve)?);
        if payout < order.min_acceptable {
            debug!(
                "Sell {} on {} rejected: {:.6} USDC < min {:.6}",
                team, self.market_id, payout, order.min_acceptable
            );
            return Ok(ExecutionResult::rejected(ErrorKind::SlippageExceeded));
        }

        let usdc_out = to_micro_decimal(payout).ok_or(CurveError::InvalidAmount(payout))?;
        if usdc_out > self.pool_value {
            warn!(
                "Sell {} on {} rejected: pool {} cannot pay {}",
                team, self.market_id, self.pool_value, usdc_out
            );
            return Ok(ExecutionResult::rejected(ErrorKind::InsufficientLiquidity));
        }

        self.set_supply(team, (supply - tokens).max(0.0));
        self.pool_value -= usdc_out;
        self.record(OrderSide::Sell, team, usdc_out, tokens);

        Ok(ExecutionResult::filled(payout, usdc_out))
    }

    fn record(&mut self, side: OrderSide, team: Team, usdc: Decimal, tokens: f64) {
        self.trades.push(TradeRecord {
            trade_id: Uuid::new_v4(),
            market_id: self.market_id.clone(),
            side,
            team,
            usdc,
            tokens,
            supply_after: self.supply(team),
            pool_after: self.pool_value,
        });
    }
}

/// Exact decimal of an amount already on the micro-unit grid
fn to_micro_decimal(amount: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(amount).map(|d| d.round_dp(USDC_DECIMALS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curvesim_core::OrderIntent;
    use curvesim_curve::ExecutionGuard;
    use rust_decimal_macros::dec;

    fn book() -> MarketBook {
        MarketBook::new(
            MarketSetup::new("m1", CurveParameters::linear_step(0.5, 0.01, 1_000.0))
                .with_supplies(1_000.0, 1_000.0)
                .with_pool(dec!(1000)),
        )
    }

    fn bound(book: &MarketBook, intent: OrderIntent) -> BoundedOrder {
        ExecutionGuard::default()
            .bound_order(intent, &book.snapshot())
            .unwrap()
    }

    #[test]
    fn test_buy_moves_supply_and_pool() {
        let engine = CurvePricingEngine::default();
        let mut book = book();
        let order = bound(&book, OrderIntent::buy(Team::A, 51.0, 0));

        let result = book.execute(&engine, &order);

        assert!(result.success);
        assert_eq!(result.realized_amount, Some(order.expected));
        assert_eq!(result.usdc_amount, Some(dec!(51)));
        assert_eq!(book.pool_value, dec!(1051));
        assert!((book.team_a_supply - 1_100.0).abs() < 1e-6);
        assert_eq!(book.trades.len(), 1);
    }

    #[test]
    fn test_stale_bound_fails_closed() {
        let engine = CurvePricingEngine::default();
        let mut book = book();
        let first = bound(&book, OrderIntent::buy(Team::A, 600.0, 0));
        let second = bound(&book, OrderIntent::buy(Team::A, 600.0, 10));

        assert!(book.execute(&engine, &first).success);
        let pool = book.pool_value;
        let supply = book.team_a_supply;

        let result = book.execute(&engine, &second);
        assert_eq!(result.error_kind, Some(ErrorKind::SlippageExceeded));
        assert_eq!(book.pool_value, pool);
        assert_eq!(book.team_a_supply, supply);
    }

    #[test]
    fn test_sell_pays_from_pool() {
        let engine = CurvePricingEngine::default();
        let mut book = book();
        let order = bound(&book, OrderIntent::sell(Team::B, 100.0, 50));

        let result = book.execute(&engine, &order);

        assert!(result.success);
        assert_eq!(result.usdc_amount, Some(dec!(50)));
        assert_eq!(book.pool_value, dec!(950));
        assert!((book.team_b_supply - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_sell_beyond_pool_is_rejected() {
        let engine = CurvePricingEngine::default();
        let mut book = MarketBook::new(
            MarketSetup::new("m1", CurveParameters::linear_step(0.5, 0.0, 1_000.0))
                .with_supplies(1_000.0, 0.0)
                .with_pool(dec!(10)),
        );
        let order = bound(&book, OrderIntent::sell(Team::A, 100.0, 50));

        let result = book.execute(&engine, &order);
        assert_eq!(result.error_kind, Some(ErrorKind::InsufficientLiquidity));
        assert_eq!(book.pool_value, dec!(10));
    }

    #[test]
    fn test_halted_and_oversized_orders() {
        let engine = CurvePricingEngine::default();
        let mut book = book();

        let oversized = BoundedOrder {
            intent: OrderIntent::sell(Team::A, 5_000.0, 50),
            expected: 0.0,
            min_acceptable: 0.0,
        };
        assert_eq!(
            book.execute(&engine, &oversized).error_kind,
            Some(ErrorKind::InsufficientBalance)
        );

        book.halted = true;
        let order = bound(&book, OrderIntent::buy(Team::A, 10.0, 50));
        assert_eq!(
            book.execute(&engine, &order).error_kind,
            Some(ErrorKind::MarketHalted)
        );
        assert!(book.trades.is_empty());
    }

    #[test]
    fn test_unpriceable_sells_leave_book_untouched() {
        let engine = CurvePricingEngine::default();
        let mut book = book();

        for tokens in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let order = BoundedOrder {
                intent: OrderIntent::sell(Team::A, tokens, 50),
                expected: 0.0,
                min_acceptable: 0.0,
            };
            let result = book.execute(&engine, &order);
            assert_eq!(result.error_kind, Some(ErrorKind::SubmissionFailure), "{}", tokens);
        }
        assert_eq!(book.pool_value, dec!(1000));
        assert_eq!(book.team_a_supply, 1_000.0);
        assert!(book.trades.is_empty());
    }

    #[test]
    fn test_setup_validation() {
        assert!(
            MarketSetup::new("m1", CurveParameters::power(0.0001, 2.0))
                .validate()
                .is_ok()
        );
        assert!(
            MarketSetup::new("m1", CurveParameters::power(-1.0, 2.0))
                .validate()
                .is_err()
        );
        assert!(
            MarketSetup::new("m1", CurveParameters::default())
                .with_supplies(-5.0, 0.0)
                .validate()
                .is_err()
        );
    }
}

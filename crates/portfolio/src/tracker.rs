//! Portfolio Tracking and Rough PnL
//!
//! Applies execution results to an agent's [`PortfolioState`]:
//! - Buys move USDC out of the balance and add tokens at their USDC cost
//! - Sells remove tokens, release a proportional share of the cost basis and
//!   credit the USDC received
//!
//! Counters are monotone and `successful + failed <= trades_executed` always
//! holds.

use std::collections::BTreeMap;

use curvesim_core::{
    ErrorKind, ExecutionResult, LastTrade, MarketId, OrderIntent, OrderSide, PortfolioState,
    Position, Team,
};
use rust_decimal::prelude::ToPrimitive;

/// Spot prices `(A, B)` per market, used to mark holdings
pub type MarkPrices = BTreeMap<MarketId, (f64, f64)>;

/// Ledger of one agent
#[derive(Debug, Clone)]
pub struct PortfolioTracker {
    state: PortfolioState,
}

impl PortfolioTracker {
    pub fn new(initial_usdc: f64) -> Self {
        Self {
            state: PortfolioState::new(initial_usdc),
        }
    }

    /// Resume tracking an existing ledger
    pub fn from_state(state: PortfolioState) -> Self {
        Self { state }
    }

    /// Current state by reference
    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> PortfolioState {
        self.state.clone()
    }

    /// Count an order handed to the gateway
    pub fn record_attempt(&mut self) {
        self.state.trades_executed += 1;
    }

    /// Count an error that happened without a submission attempt
    pub fn record_error(&mut self, kind: ErrorKind) {
        *self.state.errors.entry(kind).or_insert(0) += 1;
    }

    /// Apply the result of a submitted order
    pub fn record_result(
        &mut self,
        market_id: &MarketId,
        intent: &OrderIntent,
        result: &ExecutionResult,
        tick: u64,
    ) {
        if self.state.successful + self.state.failed >= self.state.trades_executed {
            log::warn!(
                "Result recorded without a matching attempt on {}; counting it",
                market_id
            );
            self.state.trades_executed += 1;
        }

        if !result.success {
            self.state.failed += 1;
            self.record_error(result.error_kind.unwrap_or(ErrorKind::SubmissionFailure));
            return;
        }

        let realized = result.realized_amount.unwrap_or(0.0).max(0.0);
        self.state.successful += 1;

        match intent.side {
            OrderSide::Buy => {
                let spent = result
                    .usdc_amount
                    .and_then(|usdc| usdc.to_f64())
                    .unwrap_or(intent.amount);
                self.apply_buy(market_id, intent.team, spent, realized);
            }
            OrderSide::Sell => {
                self.apply_sell(market_id, intent.team, intent.amount, realized);
            }
        }

        self.state.last_trade = Some(LastTrade {
            market_id: market_id.clone(),
            side: intent.side,
            team: intent.team,
            amount: intent.amount,
            realized,
            tick,
        });
    }

    fn apply_buy(&mut self, market_id: &MarketId, team: Team, usdc: f64, tokens: f64) {
        let position = self.state.positions.entry(market_id.clone()).or_default();
        match team {
            Team::A => {
                position.tokens_a += tokens;
                position.cost_a += usdc;
            }
            Team::B => {
                position.tokens_b += tokens;
                position.cost_b += usdc;
            }
        }

        self.state.balances.usdc -= usdc;
        self.state.usdc_spent += usdc;
        self.adjust_token_balance(team, tokens);
    }

    fn apply_sell(&mut self, market_id: &MarketId, team: Team, tokens: f64, usdc: f64) {
        let position = self.state.positions.entry(market_id.clone()).or_default();
        let (held, cost) = match team {
            Team::A => (&mut position.tokens_a, &mut position.cost_a),
            Team::B => (&mut position.tokens_b, &mut position.cost_b),
        };

        let sold = tokens.min(*held).max(0.0);
        if *held > 0.0 {
            *cost *= 1.0 - sold / *held;
        }
        *held = (*held - sold).max(0.0);
        if *held == 0.0 {
            *cost = 0.0;
        }

        self.state.balances.usdc += usdc;
        self.state.usdc_received += usdc;
        self.adjust_token_balance(team, -sold);
    }

    fn adjust_token_balance(&mut self, team: Team, delta: f64) {
        let balance = match team {
            Team::A => &mut self.state.balances.tokens_a,
            Team::B => &mut self.state.balances.tokens_b,
        };
        *balance = (*balance + delta).max(0.0);
    }

    /// Mark-to-market PnL against the starting USDC.
    ///
    /// Holdings in markets without a mark are valued at cost.
    pub fn rough_pnl(&self, marks: &MarkPrices) -> f64 {
        let holdings: f64 = self
            .state
            .positions
            .iter()
            .map(|(market_id, position)| match marks.get(market_id) {
                Some(&(price_a, price_b)) => mark_position(position, price_a, price_b),
                None => position.total_exposure(),
            })
            .sum();

        self.state.balances.usdc + holdings - self.state.initial_usdc
    }
}

fn mark_position(position: &Position, price_a: f64, price_b: f64) -> f64 {
    position.tokens_a * price_a + position.tokens_b * price_b
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn market() -> MarketId {
        MarketId::new("m1")
    }

    #[test]
    fn test_successful_buy_updates_balances() {
        let mut tracker = PortfolioTracker::new(1_000.0);
        let intent = OrderIntent::buy(Team::A, 100.0, 50);

        tracker.record_attempt();
        tracker.record_result(
            &market(),
            &intent,
            &ExecutionResult::filled(180.0, dec!(100)),
            3,
        );

        let state = tracker.snapshot();
        assert_eq!(state.trades_executed, 1);
        assert_eq!(state.successful, 1);
        assert_relative_eq!(state.balances.usdc, 900.0);
        assert_relative_eq!(state.balances.tokens_a, 180.0);
        assert_relative_eq!(state.exposure(&market(), Team::A), 100.0);
        assert_relative_eq!(state.usdc_spent, 100.0);

        let last = state.last_trade.unwrap();
        assert_eq!(last.tick, 3);
        assert_eq!(last.side, OrderSide::Buy);
    }

    #[test]
    fn test_sell_releases_cost_proportionally() {
        let mut tracker = PortfolioTracker::new(1_000.0);

        tracker.record_attempt();
        tracker.record_result(
            &market(),
            &OrderIntent::buy(Team::B, 100.0, 50),
            &ExecutionResult::filled(200.0, dec!(100)),
            1,
        );
        tracker.record_attempt();
        tracker.record_result(
            &market(),
            &OrderIntent::sell(Team::B, 50.0, 50),
            &ExecutionResult::filled(27.5, dec!(27.5)),
            2,
        );

        let state = tracker.state();
        assert_relative_eq!(state.tokens(&market(), Team::B), 150.0);
        assert_relative_eq!(state.exposure(&market(), Team::B), 75.0);
        assert_relative_eq!(state.balances.usdc, 927.5);
        assert_relative_eq!(state.usdc_received, 27.5);
        assert_eq!(state.successful, 2);
    }

    #[test]
    fn test_failure_changes_no_balances() {
        let mut tracker = PortfolioTracker::new(500.0);

        tracker.record_attempt();
        tracker.record_result(
            &market(),
            &OrderIntent::buy(Team::A, 100.0, 10),
            &ExecutionResult::rejected(ErrorKind::SlippageExceeded),
            1,
        );

        let state = tracker.state();
        assert_eq!(state.failed, 1);
        assert_eq!(state.error_count(ErrorKind::SlippageExceeded), 1);
        assert_relative_eq!(state.balances.usdc, 500.0);
        assert!(state.positions.is_empty());
        assert!(state.last_trade.is_none());
    }

    #[test]
    fn test_counts_stay_consistent() {
        let mut tracker = PortfolioTracker::new(100.0);

        tracker.record_error(ErrorKind::StateFetchFailure);
        tracker.record_result(
            &market(),
            &OrderIntent::buy(Team::A, 10.0, 10),
            &ExecutionResult::rejected(ErrorKind::MarketHalted),
            1,
        );

        let state = tracker.state();
        assert_eq!(state.trades_executed, 1);
        assert!(state.successful + state.failed <= state.trades_executed);
        assert_eq!(state.total_errors(), 2);
    }

    #[test]
    fn test_rough_pnl_marks_holdings() {
        let mut tracker = PortfolioTracker::new(1_000.0);

        tracker.record_attempt();
        tracker.record_result(
            &market(),
            &OrderIntent::buy(Team::A, 100.0, 50),
            &ExecutionResult::filled(200.0, dec!(100)),
            1,
        );

        let mut marks = MarkPrices::new();
        assert_relative_eq!(tracker.rough_pnl(&marks), 0.0);

        marks.insert(market(), (0.6, 0.4));
        assert_relative_eq!(tracker.rough_pnl(&marks), 20.0, max_relative = 1e-9);
    }
}

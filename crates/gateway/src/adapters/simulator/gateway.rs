//! In-memory implementation of the market gateway port
//!
//! Each market sits behind its own map shard lock, so orders on different
//! markets settle in parallel while orders on one market settle one at a
//! time against the latest state.

use std::time::Duration;

use async_trait::async_trait;
use curvesim_core::{BoundedOrder, ExecutionResult, MarketId, MarketStateSnapshot};
use curvesim_curve::CurvePricingEngine;
use curvesim_ports::{GatewayError, GatewayResult, MarketGateway};
use dashmap::DashMap;
use log::{debug, info, warn};
use rust_decimal::Decimal;

use super::book::{MarketBook, MarketSetup, TradeRecord};
use crate::error::SimulatorError;

/// Simulated bonding curve markets
pub struct SimulatedGateway {
    engine: CurvePricingEngine,
    markets: DashMap<MarketId, MarketBook>,
    /// Delay before each submission settles
    latency: Option<Duration>,
}

impl SimulatedGateway {
    pub fn new(engine: CurvePricingEngine) -> Self {
        Self {
            engine,
            markets: DashMap::new(),
            latency: None,
        }
    }

    /// Delay every submission by `latency` before it settles
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register a market
    pub fn add_market(&self, setup: MarketSetup) -> Result<(), SimulatorError> {
        setup
            .validate()
            .map_err(|reason| SimulatorError::InvalidMarket {
                market_id: setup.id.clone(),
                reason,
            })?;

        match self.markets.entry(setup.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(SimulatorError::DuplicateMarket(setup.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                info!(
                    "Market {} opened: supplies {}/{}, pool {}",
                    setup.id, setup.team_a_supply, setup.team_b_supply, setup.pool_value
                );
                slot.insert(MarketBook::new(setup));
                Ok(())
            }
        }
    }

    /// Build a gateway holding the given markets
    pub fn with_markets(
        engine: CurvePricingEngine,
        setups: impl IntoIterator<Item = MarketSetup>,
    ) -> Result<Self, SimulatorError> {
        let gateway = Self::new(engine);
        for setup in setups {
            gateway.add_market(setup)?;
        }
        Ok(gateway)
    }

    fn with_book<T>(
        &self,
        market_id: &MarketId,
        f: impl FnOnce(&mut MarketBook) -> T,
    ) -> Result<T, SimulatorError> {
        let mut book = self
            .markets
            .get_mut(market_id)
            .ok_or_else(|| SimulatorError::UnknownMarket(market_id.clone()))?;
        Ok(f(&mut book))
    }

    /// Stop a market from accepting orders
    pub fn halt(&self, market_id: &MarketId) -> Result<(), SimulatorError> {
        warn!("Market {} halted", market_id);
        self.with_book(market_id, |book| book.halted = true)
    }

    pub fn resume(&self, market_id: &MarketId) -> Result<(), SimulatorError> {
        info!("Market {} resumed", market_id);
        self.with_book(market_id, |book| book.halted = false)
    }

    /// Make the next `count` state fetches of a market fail
    pub fn fail_next_fetches(&self, market_id: &MarketId, count: u32) -> Result<(), SimulatorError> {
        self.with_book(market_id, |book| book.failing_fetches = count)
    }

    /// Make the next `count` submissions to a market fail in transport
    pub fn fail_next_submissions(
        &self,
        market_id: &MarketId,
        count: u32,
    ) -> Result<(), SimulatorError> {
        self.with_book(market_id, |book| book.failing_submissions = count)
    }

    /// Current state without consuming injected faults
    pub fn peek(&self, market_id: &MarketId) -> Option<MarketStateSnapshot> {
        self.markets.get(market_id).map(|book| book.snapshot())
    }

    /// Pool value the market started with
    pub fn initial_pool(&self, market_id: &MarketId) -> Option<Decimal> {
        self.markets.get(market_id).map(|book| book.initial_pool)
    }

    /// Settled trades of a market, oldest first
    pub fn trades(&self, market_id: &MarketId) -> Vec<TradeRecord> {
        self.markets
            .get(market_id)
            .map(|book| book.trades.clone())
            .unwrap_or_default()
    }

    pub fn market_ids(&self) -> Vec<MarketId> {
        let mut ids: Vec<MarketId> = self.markets.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl MarketGateway for SimulatedGateway {
    async fn fetch_market_state(&self, market_id: &MarketId) -> GatewayResult<MarketStateSnapshot> {
        let mut book = self
            .markets
            .get_mut(market_id)
            .ok_or_else(|| GatewayError::UnknownMarket(market_id.clone()))?;

        if book.failing_fetches > 0 {
            book.failing_fetches -= 1;
            return Err(GatewayError::StateFetch {
                market_id: market_id.clone(),
                reason: "injected fault".to_string(),
            });
        }

        Ok(book.snapshot())
    }

    async fn submit_order(
        &self,
        market_id: &MarketId,
        order: &BoundedOrder,
    ) -> GatewayResult<ExecutionResult> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut book = self
            .markets
            .get_mut(market_id)
            .ok_or_else(|| GatewayError::UnknownMarket(market_id.clone()))?;

        if book.failing_submissions > 0 {
            book.failing_submissions -= 1;
            return Err(GatewayError::Unavailable(format!(
                "submission to {} dropped",
                market_id
            )));
        }

        let result = book.execute(&self.engine, order);
        debug!(
            "{} {} {:.6} on {} -> {:?}",
            order.intent.side, order.intent.team, order.intent.amount, market_id, result
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curvesim_core::CurveParameters;
    use rust_decimal_macros::dec;

    fn gateway() -> SimulatedGateway {
        SimulatedGateway::with_markets(
            CurvePricingEngine::default(),
            [MarketSetup::new("m1", CurveParameters::default()).with_pool(dec!(100))],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_and_unknown_markets() {
        let gateway = gateway();
        let again = MarketSetup::new("m1", CurveParameters::default());

        assert_eq!(
            gateway.add_market(again),
            Err(SimulatorError::DuplicateMarket(MarketId::new("m1")))
        );
        assert!(gateway.halt(&MarketId::new("nope")).is_err());
        assert_eq!(gateway.market_ids(), vec![MarketId::new("m1")]);
        assert_eq!(gateway.initial_pool(&MarketId::new("m1")), Some(dec!(100)));
    }

    #[test]
    fn test_invalid_market_rejected() {
        let gateway = SimulatedGateway::new(CurvePricingEngine::default());
        let bad = MarketSetup::new("bad", CurveParameters::linear_step(0.0, 0.1, 10.0));

        assert!(matches!(
            gateway.add_market(bad),
            Err(SimulatorError::InvalidMarket { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_faults_are_consumed() {
        let gateway = gateway();
        let id = MarketId::new("m1");
        gateway.fail_next_fetches(&id, 2).unwrap();

        assert!(gateway.fetch_market_state(&id).await.is_err());
        assert!(gateway.fetch_market_state(&id).await.is_err());
        let snapshot = gateway.fetch_market_state(&id).await.unwrap();
        assert_eq!(snapshot.pool_value, dec!(100));
        assert!(matches!(
            gateway.fetch_market_state(&MarketId::new("x")).await,
            Err(GatewayError::UnknownMarket(_))
        ));
    }
}

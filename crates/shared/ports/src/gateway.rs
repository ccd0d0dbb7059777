use async_trait::async_trait;
use curvesim_core::{BoundedOrder, ExecutionResult, MarketId, MarketStateSnapshot};

use crate::error::GatewayResult;

/// Port for the external market gateway
///
/// The gateway owns everything ledger-related (transactions, signing,
/// custody) and is the sole enforcer of an order's slippage bound: an order
/// either clears with `realized_amount >= min_acceptable` or fails without
/// changing market state.
#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// Read the current state of a market
    async fn fetch_market_state(&self, market_id: &MarketId) -> GatewayResult<MarketStateSnapshot>;

    /// Submit a bounded order and wait for its confirmation
    async fn submit_order(
        &self,
        market_id: &MarketId,
        order: &BoundedOrder,
    ) -> GatewayResult<ExecutionResult>;

    /// Get the gateway's name for logging
    fn name(&self) -> &str {
        "MarketGateway"
    }
}

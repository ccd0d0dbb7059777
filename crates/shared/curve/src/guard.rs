use curvesim_core::{BoundedOrder, MarketStateSnapshot, OrderIntent, OrderSide, USDC_DECIMALS};

use crate::engine::CurvePricingEngine;
use crate::error::{CurveError, CurveResult};
use crate::slippage::{MAX_SLIPPAGE_BPS, SlippagePolicy};

/// Truncate an amount to 6 decimal places (USDC micro-units)
pub fn floor_to_micro(amount: f64) -> f64 {
    let scale = 10f64.powi(USDC_DECIMALS as i32);
    ((amount * scale).floor() / scale).min(amount)
}

/// Lowest output an order accepts: `expected * (1 - bps / 10000)` floored
/// to 6 decimal places
pub fn min_acceptable(expected: f64, slippage_bps: u32) -> CurveResult<f64> {
    if slippage_bps > MAX_SLIPPAGE_BPS {
        return Err(CurveError::InvalidSlippage(slippage_bps));
    }
    if !expected.is_finite() || expected < 0.0 {
        return Err(CurveError::InvalidAmount(expected));
    }

    let scaled = expected * (1.0 - SlippagePolicy::tolerance(slippage_bps));
    Ok(floor_to_micro(scaled).max(0.0))
}

/// Attaches slippage bounds to order intents.
///
/// The guard only computes the bound; the gateway enforces it atomically.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionGuard {
    engine: CurvePricingEngine,
}

impl ExecutionGuard {
    pub fn new(engine: CurvePricingEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &CurvePricingEngine {
        &self.engine
    }

    /// Output the intent would receive against `snapshot`.
    ///
    /// Buy amounts are spent in whole USDC micro-units.
    pub fn expected_output(
        &self,
        intent: &OrderIntent,
        snapshot: &MarketStateSnapshot,
    ) -> CurveResult<f64> {
        let supply = snapshot.supply(intent.team);
        match intent.side {
            OrderSide::Buy => {
                self.engine
                    .tokens_out(floor_to_micro(intent.amount), supply, &snapshot.curve)
            }
            OrderSide::Sell => self.engine.usdc_out(intent.amount, supply, &snapshot.curve),
        }
    }

    /// Compute `expected` and `min_acceptable` for an intent
    pub fn bound_order(
        &self,
        intent: OrderIntent,
        snapshot: &MarketStateSnapshot,
    ) -> CurveResult<BoundedOrder> {
        if intent.slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(CurveError::InvalidSlippage(intent.slippage_bps));
        }

        let expected = self.expected_output(&intent, snapshot)?;
        let min_acceptable = min_acceptable(expected, intent.slippage_bps)?;

        log::trace!(
            "Bounded {} {} {:.6} on {}: expected {:.6}, min {:.6}",
            intent.side,
            intent.team,
            intent.amount,
            snapshot.market_id,
            expected,
            min_acceptable
        );

        Ok(BoundedOrder {
            intent,
            expected,
            min_acceptable,
        })
    }
}

//! Curvesim Curve Math
//!
//! Bonding curve pricing, trade integration and the slippage guard that
//! bounds every order before it reaches a market gateway.

mod engine;
mod error;
mod guard;
mod slippage;

pub use engine::{CurvePricingEngine, DEFAULT_INTEGRATION_STEPS, implied_probability};
pub use error::{CurveError, CurveResult};
pub use guard::{ExecutionGuard, floor_to_micro, min_acceptable};
pub use slippage::{MAX_SLIPPAGE_BPS, SlippagePolicy};

use serde::{Deserialize, Serialize};

/// Bonding curve shape of a market. Immutable for the lifetime of the market.
///
/// - `LinearStep`: `price = base_price + slope * floor(supply / unit)`
/// - `Power`: `price = k * supply^n`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveParameters {
    LinearStep {
        /// Price at zero supply
        base_price: f64,
        /// Price increment per completed unit of supply
        slope: f64,
        /// Supply per price step
        unit: f64,
    },
    Power {
        /// Scale factor (also the price at zero supply)
        k: f64,
        /// Exponent
        n: f64,
    },
}

impl CurveParameters {
    /// Create a linear step curve
    pub fn linear_step(base_price: f64, slope: f64, unit: f64) -> Self {
        CurveParameters::LinearStep {
            base_price,
            slope,
            unit,
        }
    }

    /// Create a power curve
    pub fn power(k: f64, n: f64) -> Self {
        CurveParameters::Power { k, n }
    }

    /// Price quoted at zero supply
    pub fn base_price(&self) -> f64 {
        match self {
            CurveParameters::LinearStep { base_price, .. } => *base_price,
            CurveParameters::Power { k, .. } => *k,
        }
    }
}

impl Default for CurveParameters {
    fn default() -> Self {
        Self::linear_step(0.5, 0.01, 1_000.0)
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Decimal places of USDC (and of outcome tokens) in base units
pub const USDC_DECIMALS: u32 = 6;

/// Truncate an f64 amount to USDC base-unit precision.
///
/// Returns `None` for non-finite input.
pub fn quantize_usdc(amount: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(amount)
        .map(|d| d.round_dp_with_strategy(USDC_DECIMALS, RoundingStrategy::ToZero))
}

/// Unique identifier for a market
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(pub String);

impl MarketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MarketId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for a trading agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantize_truncates_to_micro_units() {
        assert_eq!(quantize_usdc(1.2345678), Some(dec!(1.234567)));
        assert_eq!(quantize_usdc(100.0), Some(dec!(100)));
        assert_eq!(quantize_usdc(f64::NAN), None);
    }

    #[test]
    fn test_market_id_serializes_as_string() {
        let id = MarketId::new("final-2026");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"final-2026\"");
    }
}

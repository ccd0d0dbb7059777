//! Bounded rolling window of recent prices.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-capacity price window. Pushing into a full window evicts the
/// oldest sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    prices: VecDeque<f64>,
    capacity: usize,
}

impl PriceHistory {
    /// Create an empty window. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            prices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a window from samples, oldest first
    pub fn from_prices(capacity: usize, prices: impl IntoIterator<Item = f64>) -> Self {
        let mut history = Self::new(capacity);
        for price in prices {
            history.push(price);
        }
        history
    }

    /// Append a sample, returning the evicted one if the window was full
    pub fn push(&mut self, price: f64) -> Option<f64> {
        let evicted = if self.prices.len() >= self.capacity {
            self.prices.pop_front()
        } else {
            None
        };
        self.prices.push_back(price);
        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.prices.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.prices.back().copied()
    }

    pub fn oldest(&self) -> Option<f64> {
        self.prices.front().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.prices.iter()
    }

    /// Simple returns between consecutive samples. Pairs starting at a
    /// zero price are skipped.
    pub fn returns(&self) -> Vec<f64> {
        self.prices
            .iter()
            .zip(self.prices.iter().skip(1))
            .filter(|(prev, _)| **prev != 0.0)
            .map(|(prev, next)| (next - prev) / prev)
            .collect()
    }

    /// Population standard deviation of returns; 0 with fewer than two returns
    pub fn volatility(&self) -> f64 {
        let returns = self.returns();
        if returns.len() < 2 {
            return 0.0;
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt()
    }

    /// Mean of the most recent `window` samples
    pub fn moving_average(&self, window: usize) -> Option<f64> {
        if window == 0 || self.prices.len() < window {
            return None;
        }
        let sum: f64 = self.prices.iter().rev().take(window).sum();
        Some(sum / window as f64)
    }

    /// Relative change from the oldest to the newest sample
    pub fn momentum(&self) -> Option<f64> {
        if self.prices.len() < 2 {
            return None;
        }
        let first = self.oldest()?;
        let last = self.latest()?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut history = PriceHistory::new(3);
        assert_eq!(history.push(1.0), None);
        history.push(2.0);
        history.push(3.0);
        assert!(history.is_full());

        assert_eq!(history.push(4.0), Some(1.0));
        assert_eq!(history.len(), 3);
        assert_eq!(history.oldest(), Some(2.0));
        assert_eq!(history.latest(), Some(4.0));
    }

    #[test]
    fn test_momentum() {
        let history = PriceHistory::from_prices(5, [1.0, 1.0, 1.0, 1.0, 1.2]);
        let momentum = history.momentum().unwrap();
        assert!((momentum - 0.2).abs() < 1e-12);

        let single = PriceHistory::from_prices(5, [1.0]);
        assert_eq!(single.momentum(), None);
    }

    #[test]
    fn test_volatility_of_flat_series_is_zero() {
        let history = PriceHistory::from_prices(10, [0.5; 10]);
        assert_eq!(history.volatility(), 0.0);
    }

    #[test]
    fn test_volatility_of_alternating_series() {
        // Returns alternate between +100% and -50%
        let history = PriceHistory::from_prices(4, [1.0, 2.0, 1.0, 2.0]);
        assert_eq!(history.returns(), vec![1.0, -0.5, 1.0]);
        assert!(history.volatility() > 0.5);
    }

    #[test]
    fn test_moving_average_uses_latest_samples() {
        let history = PriceHistory::from_prices(10, [1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(history.moving_average(2), Some(4.5));
        assert_eq!(history.moving_average(5), Some(3.0));
        assert_eq!(history.moving_average(6), None);
    }
}

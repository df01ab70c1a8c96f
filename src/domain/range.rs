//! Liquidity Ranges
//!
//! A placed position pair: index 0 is always the base range and index 1
//! the limit range. Both carry the forecast that produced them so the
//! volatility-decay check can compare against it later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tick::TickRange;

/// One placed liquidity position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRange {
    /// Pool price when the range was placed
    pub price: f64,
    /// price * (1 + return_forecast)
    pub target_price: f64,
    pub lower_tick: i32,
    pub upper_tick: i32,
    /// Unsnapped lower price bound
    pub lower_price: f64,
    /// Unsnapped upper price bound
    pub upper_price: f64,
    pub timestamp: DateTime<Utc>,
    pub token_0_amount: f64,
    pub token_1_amount: f64,
    pub position_liquidity: u128,
    /// Annualized sd_forecast at placement
    pub volatility: f64,
    pub reset_time: DateTime<Utc>,
    /// Clamped return forecast at placement
    pub return_forecast: f64,
}

impl LiquidityRange {
    pub fn ticks(&self) -> TickRange {
        TickRange::new(self.lower_tick, self.upper_tick)
    }

    /// token_0 + token_1 * price, the balance the rebalance trigger compares
    pub fn balance_at(&self, price: f64) -> f64 {
        self.token_0_amount + self.token_1_amount * price
    }

    /// token_0 + token_1 / price, value denominated in token 0
    pub fn value_at(&self, price: f64) -> f64 {
        self.token_0_amount + self.token_1_amount / price
    }
}

/// Exactly two ranges, `[base, limit]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePair {
    pub base: LiquidityRange,
    pub limit: LiquidityRange,
}

impl RangePair {
    pub fn new(base: LiquidityRange, limit: LiquidityRange) -> Self {
        Self { base, limit }
    }

    /// Ranges in placement order, base first
    pub fn as_array(&self) -> [&LiquidityRange; 2] {
        [&self.base, &self.limit]
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiquidityRange> {
        self.as_array().into_iter()
    }

    /// Combined trigger balance of both ranges at `price`
    pub fn balance_at(&self, price: f64) -> f64 {
        self.base.balance_at(price) + self.limit.balance_at(price)
    }

    pub fn token_0_allocated(&self) -> f64 {
        self.iter().map(|r| r.token_0_amount).sum()
    }

    pub fn token_1_allocated(&self) -> f64 {
        self.iter().map(|r| r.token_1_amount).sum()
    }
}

impl std::ops::Index<usize> for RangePair {
    type Output = LiquidityRange;

    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.base,
            1 => &self.limit,
            _ => panic!("RangePair index out of bounds: {index} (only base=0 and limit=1)"),
        }
    }
}

/// Outer band whose breach forces a reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub reset_range_lower: f64,
    pub reset_range_upper: f64,
}

impl StrategyInfo {
    pub fn new(reset_range_lower: f64, reset_range_upper: f64) -> Self {
        Self {
            reset_range_lower,
            reset_range_upper,
        }
    }

    /// Price has left the reset band on either side
    pub fn is_exited(&self, price: f64) -> bool {
        price < self.reset_range_lower || price > self.reset_range_upper
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn range(token_0: f64, token_1: f64, volatility: f64) -> LiquidityRange {
        let t = Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap();
        LiquidityRange {
            price: 100.0,
            target_price: 101.0,
            lower_tick: 45_000,
            upper_tick: 47_000,
            lower_price: 90.0,
            upper_price: 112.0,
            timestamp: t,
            token_0_amount: token_0,
            token_1_amount: token_1,
            position_liquidity: 1_000,
            volatility,
            reset_time: t,
            return_forecast: 0.01,
        }
    }
}

//! Strategy Observation
//!
//! The per-step state the simulation harness owns and lends to the strategy.
//! The strategy mutates only the reset flags, left-over tokens and deposit
//! totals; new ranges and strategy info are returned to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StrategyError;
use super::range::{RangePair, StrategyInfo};

/// Pool geometry needed for tick math
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolGeometry {
    pub tick_spacing: i32,
    pub decimals_0: u8,
    pub decimals_1: u8,
    /// 10^(decimals_1 - decimals_0): raw pool price = decimal_adjustment * price
    pub decimal_adjustment: f64,
}

impl PoolGeometry {
    /// Geometry with the decimal adjustment derived from the token decimals
    pub fn new(tick_spacing: i32, decimals_0: u8, decimals_1: u8) -> Self {
        let decimal_adjustment = 10f64.powi(decimals_1 as i32 - decimals_0 as i32);
        Self {
            tick_spacing,
            decimals_0,
            decimals_1,
            decimal_adjustment,
        }
    }

    pub fn decimals(&self) -> TokenDecimals {
        TokenDecimals {
            decimals_0: self.decimals_0,
            decimals_1: self.decimals_1,
        }
    }
}

/// Token decimals handed to the AMM math
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDecimals {
    pub decimals_0: u8,
    pub decimals_1: u8,
}

/// Realized and uncollected fees per token
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeState {
    pub token_0_fees: f64,
    pub token_1_fees: f64,
    pub token_0_fees_uncollected: f64,
    pub token_1_fees_uncollected: f64,
}

/// Why a reset fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetReason {
    /// Price left the reset band
    ExitedRange,
    /// Volatility decayed below the reset ratio
    VolRebalance,
    /// Too much value sitting outside the ranges
    TokensOutsideLarge,
}

impl ResetReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetReason::ExitedRange => "exited_range",
            ResetReason::VolRebalance => "vol_rebalance",
            ResetReason::TokensOutsideLarge => "tokens_outside_large",
        }
    }
}

impl std::fmt::Display for ResetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current observation of the pool and the strategy's holdings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyObservation {
    pub time: DateTime<Utc>,
    pub price: f64,
    /// Current pool tick
    pub price_tick: i32,
    pub pool: PoolGeometry,
    /// `None` until the first allocation
    pub liquidity_ranges: Option<RangePair>,
    pub strategy_info: Option<StrategyInfo>,
    /// Tokens deposited but not yet placed
    pub liquidity_in_0: f64,
    pub liquidity_in_1: f64,
    /// Tokens not allocated to any range
    pub token_0_left_over: f64,
    pub token_1_left_over: f64,
    pub fees: FeeState,
    pub reset_point: bool,
    pub reset_reason: Option<ResetReason>,
}

impl StrategyObservation {
    /// Fresh observation holding only deposits, nothing placed yet
    pub fn new(
        time: DateTime<Utc>,
        price: f64,
        price_tick: i32,
        pool: PoolGeometry,
        liquidity_in_0: f64,
        liquidity_in_1: f64,
    ) -> Self {
        Self {
            time,
            price,
            price_tick,
            pool,
            liquidity_ranges: None,
            strategy_info: None,
            liquidity_in_0,
            liquidity_in_1,
            token_0_left_over: 0.0,
            token_1_left_over: 0.0,
            fees: FeeState::default(),
            reset_point: false,
            reset_reason: None,
        }
    }

    pub fn ranges(&self) -> Result<&RangePair, StrategyError> {
        self.liquidity_ranges
            .as_ref()
            .ok_or(StrategyError::MissingState("liquidity_ranges"))
    }

    pub fn info(&self) -> Result<&StrategyInfo, StrategyError> {
        self.strategy_info
            .as_ref()
            .ok_or(StrategyError::MissingState("strategy_info"))
    }

    /// Left-over balance as the trigger measures it: token_0 + token_1 * price
    pub fn left_over_balance(&self) -> f64 {
        self.token_0_left_over + self.token_1_left_over * self.price
    }
}

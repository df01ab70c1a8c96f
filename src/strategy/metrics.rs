//! Metrics Reporter
//!
//! Flat per-step record of the strategy state for the harness to collect.
//! Values are denominated in token 0: value = token_0 + token_1 / price.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{ResetReason, StrategyError, StrategyObservation};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyMetrics {
    pub time: DateTime<Utc>,
    pub price: f64,
    pub reset_point: bool,
    pub reset_reason: Option<ResetReason>,
    pub volatility: f64,
    pub return_forecast: f64,

    pub base_range_lower: f64,
    pub base_range_upper: f64,
    pub limit_range_lower: f64,
    pub limit_range_upper: f64,
    pub reset_range_lower: f64,
    pub reset_range_upper: f64,

    pub token_0_fees: f64,
    pub token_1_fees: f64,
    pub token_0_fees_uncollected: f64,
    pub token_1_fees_uncollected: f64,

    pub token_0_left_over: f64,
    pub token_1_left_over: f64,
    pub base_token_0: f64,
    pub base_token_1: f64,
    pub limit_token_0: f64,
    pub limit_token_1: f64,
    pub token_0_allocated: f64,
    pub token_1_allocated: f64,
    /// Allocated + left-over + uncollected fees
    pub token_0_total: f64,
    pub token_1_total: f64,

    pub value_position: f64,
    pub value_allocated: f64,
    pub value_left_over: f64,
    pub base_position_value: f64,
    pub limit_position_value: f64,
}

/// Summarize the observation. Requires placed ranges and a reset band.
pub fn strategy_metrics(observation: &StrategyObservation) -> Result<StrategyMetrics, StrategyError> {
    let ranges = observation.ranges()?;
    let info = observation.info()?;
    let price = observation.price;
    let fees = observation.fees;
    let value = |token_0: f64, token_1: f64| token_0 + token_1 / price;

    let token_0_allocated = ranges.token_0_allocated();
    let token_1_allocated = ranges.token_1_allocated();
    let token_0_total = token_0_allocated + observation.token_0_left_over + fees.token_0_fees_uncollected;
    let token_1_total = token_1_allocated + observation.token_1_left_over + fees.token_1_fees_uncollected;

    Ok(StrategyMetrics {
        time: observation.time,
        price,
        reset_point: observation.reset_point,
        reset_reason: observation.reset_reason,
        volatility: ranges.base.volatility,
        return_forecast: ranges.base.return_forecast,

        base_range_lower: ranges.base.lower_price,
        base_range_upper: ranges.base.upper_price,
        limit_range_lower: ranges.limit.lower_price,
        limit_range_upper: ranges.limit.upper_price,
        reset_range_lower: info.reset_range_lower,
        reset_range_upper: info.reset_range_upper,

        token_0_fees: fees.token_0_fees,
        token_1_fees: fees.token_1_fees,
        token_0_fees_uncollected: fees.token_0_fees_uncollected,
        token_1_fees_uncollected: fees.token_1_fees_uncollected,

        token_0_left_over: observation.token_0_left_over,
        token_1_left_over: observation.token_1_left_over,
        base_token_0: ranges.base.token_0_amount,
        base_token_1: ranges.base.token_1_amount,
        limit_token_0: ranges.limit.token_0_amount,
        limit_token_1: ranges.limit.token_1_amount,
        token_0_allocated,
        token_1_allocated,
        token_0_total,
        token_1_total,

        value_position: value(token_0_total, token_1_total),
        value_allocated: value(token_0_allocated, token_1_allocated),
        value_left_over: value(observation.token_0_left_over, observation.token_1_left_over),
        base_position_value: ranges.base.value_at(price),
        limit_position_value: ranges.limit.value_at(price),
    })
}

//! Rebalance Trigger
//!
//! Three conditions force the position pair to be withdrawn and re-placed:
//! 1. Price left the reset band
//! 2. Forecast volatility decayed relative to the volatility at placement
//! 3. Too much value sits idle outside the ranges
//!
//! When several hold at once the reported reason follows `RESET_PRIORITY`.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{ForecastResult, ResetReason, StrategyError, StrategyObservation};
use crate::strategy::params::StrategyParameters;

/// First true condition names the reset
pub const RESET_PRIORITY: [ResetReason; 3] = [
    ResetReason::ExitedRange,
    ResetReason::VolRebalance,
    ResetReason::TokensOutsideLarge,
];

/// Evaluated reset conditions for one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetConditions {
    pub exited_range: bool,
    pub vol_rebalance: bool,
    pub tokens_outside_large: bool,
}

impl ResetConditions {
    pub fn holds(&self, reason: ResetReason) -> bool {
        match reason {
            ResetReason::ExitedRange => self.exited_range,
            ResetReason::VolRebalance => self.vol_rebalance,
            ResetReason::TokensOutsideLarge => self.tokens_outside_large,
        }
    }

    /// Highest-priority condition that holds
    pub fn reason(&self) -> Option<ResetReason> {
        RESET_PRIORITY.iter().copied().find(|r| self.holds(*r))
    }

    pub fn any(&self) -> bool {
        self.reason().is_some()
    }
}

/// Conditions plus the forecast fitted for the volatility check, if one ran
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEvaluation {
    pub conditions: ResetConditions,
    pub forecast: Option<ForecastResult>,
}

/// Whether whole minutes elapsed since `reset_time` land on the check cadence
pub fn volatility_check_due(reset_time: DateTime<Utc>, now: DateTime<Utc>, cadence_minutes: i64) -> bool {
    if cadence_minutes <= 0 {
        return false;
    }
    let elapsed_minutes = (now - reset_time).num_milliseconds().div_euclid(60_000);
    elapsed_minutes.rem_euclid(cadence_minutes) == 0
}

/// Evaluate all reset conditions against the ranges currently placed.
/// `forecast` is called at most once, and only when the volatility check is due.
pub fn evaluate<F>(
    observation: &StrategyObservation,
    params: &StrategyParameters,
    forecast: F,
) -> Result<TriggerEvaluation, StrategyError>
where
    F: FnOnce(DateTime<Utc>) -> Result<ForecastResult, StrategyError>,
{
    let ranges = observation.ranges()?;
    let info = observation.info()?;
    let price = observation.price;

    let exited_range = info.is_exited(price);

    let mut model_forecast = None;
    let mut vol_rebalance = false;
    if volatility_check_due(ranges.base.reset_time, observation.time, params.volatility_check_minutes) {
        let fresh = forecast(observation.time)?;
        let ratio = fresh.sd_forecast / ranges.base.volatility;
        vol_rebalance = ratio <= params.volatility_reset_ratio;
        debug!(
            time = %observation.time,
            sd_forecast = fresh.sd_forecast,
            placed_volatility = ranges.base.volatility,
            ratio,
            vol_rebalance,
            "Volatility check evaluated"
        );
        model_forecast = Some(fresh);
    }

    let tokens_outside_large =
        observation.left_over_balance() > params.tokens_outside_reset * ranges.balance_at(price);

    Ok(TriggerEvaluation {
        conditions: ResetConditions {
            exited_range,
            vol_rebalance,
            tokens_outside_large,
        },
        forecast: model_forecast,
    })
}

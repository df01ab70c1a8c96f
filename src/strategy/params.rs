//! Strategy Parameters
//!
//! Immutable per-instance configuration for the autoregressive range strategy.
//! Defaults follow the reference deployment: idle tokens above 5% of the
//! position value force a reset, forecasts use a 90 day window.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::DataFrequency;

/// Default share of position value allowed to sit outside the ranges
pub const DEFAULT_TOKENS_OUTSIDE_RESET: f64 = 0.05;
/// Trailing window of returns used for each fit
pub const DEFAULT_FORECAST_WINDOW_DAYS: i64 = 90;
/// Largest absolute return forecast used for placement
pub const DEFAULT_RETURN_CLAMP: f64 = 0.25;
/// Outlier cutoff for the data cleaner
pub const DEFAULT_Z_SCORE_CUTOFF: f64 = 3.0;
/// Volatility decay is checked on this minute cadence since the last reset
pub const DEFAULT_VOLATILITY_CHECK_MINUTES: i64 = 60;

/// Main strategy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParameters {
    /// Base range half-width in units of forecast sd
    pub alpha: f64,
    /// Reset band half-width in units of forecast sd (expected >= alpha)
    pub tau: f64,
    /// sd_forecast / placed volatility at or below this triggers a reset
    pub volatility_reset_ratio: f64,
    /// Idle value above this fraction of range value triggers a reset
    pub tokens_outside_reset: f64,
    /// Sampling frequency of the model data
    pub data_frequency: DataFrequency,
    pub forecast_window_days: i64,
    pub return_clamp: f64,
    pub z_score_cutoff: f64,
    pub volatility_check_minutes: i64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        Self {
            alpha: 2.0,
            tau: 2.0,
            volatility_reset_ratio: 0.8,
            tokens_outside_reset: DEFAULT_TOKENS_OUTSIDE_RESET,
            data_frequency: DataFrequency::Daily,
            forecast_window_days: DEFAULT_FORECAST_WINDOW_DAYS,
            return_clamp: DEFAULT_RETURN_CLAMP,
            z_score_cutoff: DEFAULT_Z_SCORE_CUTOFF,
            volatility_check_minutes: DEFAULT_VOLATILITY_CHECK_MINUTES,
        }
    }
}

impl StrategyParameters {
    /// Parameters with the construction surface every deployment sets
    pub fn new(alpha: f64, tau: f64, volatility_reset_ratio: f64) -> Self {
        Self {
            alpha,
            tau,
            volatility_reset_ratio,
            ..Default::default()
        }
    }

    pub fn with_tokens_outside_reset(mut self, fraction: f64) -> Self {
        self.tokens_outside_reset = fraction;
        self
    }

    pub fn with_data_frequency(mut self, frequency: DataFrequency) -> Self {
        self.data_frequency = frequency;
        self
    }

    pub fn with_forecast_window_days(mut self, days: i64) -> Self {
        self.forecast_window_days = days;
        self
    }

    /// Trailing fit window as a duration
    pub fn forecast_window(&self) -> Result<Duration, ParameterError> {
        let days = self.forecast_window_days;
        Duration::try_days(days)
            .filter(|_| days > 0)
            .ok_or(ParameterError::InvalidForecastWindow(days))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !(self.alpha > 0.0) || !self.alpha.is_finite() {
            return Err(ParameterError::InvalidAlpha(self.alpha));
        }
        if !(self.tau > 0.0) || !self.tau.is_finite() {
            return Err(ParameterError::InvalidTau(self.tau));
        }
        if !(self.volatility_reset_ratio > 0.0) {
            return Err(ParameterError::InvalidVolatilityResetRatio(self.volatility_reset_ratio));
        }
        if !(self.tokens_outside_reset >= 0.0) {
            return Err(ParameterError::InvalidTokensOutsideReset(self.tokens_outside_reset));
        }
        self.forecast_window()?;
        if !(self.return_clamp > 0.0 && self.return_clamp < 1.0) {
            return Err(ParameterError::InvalidReturnClamp(self.return_clamp));
        }
        if !(self.z_score_cutoff > 0.0) {
            return Err(ParameterError::InvalidZScoreCutoff(self.z_score_cutoff));
        }
        if self.volatility_check_minutes <= 0 {
            return Err(ParameterError::InvalidVolatilityCheck(self.volatility_check_minutes));
        }
        if self.tau < self.alpha {
            tracing::warn!(
                alpha = self.alpha,
                tau = self.tau,
                "Reset band narrower than base range; resets will fire before the base range is left"
            );
        }
        Ok(())
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("Invalid alpha: {0} (must be > 0)")]
    InvalidAlpha(f64),
    #[error("Invalid tau: {0} (must be > 0)")]
    InvalidTau(f64),
    #[error("Invalid volatility reset ratio: {0} (must be > 0)")]
    InvalidVolatilityResetRatio(f64),
    #[error("Invalid tokens outside reset: {0} (must be >= 0)")]
    InvalidTokensOutsideReset(f64),
    #[error("Invalid forecast window: {0} days (must be > 0 and representable)")]
    InvalidForecastWindow(i64),
    #[error("Invalid return clamp: {0} (must be 0 < clamp < 1)")]
    InvalidReturnClamp(f64),
    #[error("Invalid z-score cutoff: {0} (must be > 0)")]
    InvalidZScoreCutoff(f64),
    #[error("Invalid volatility check cadence: {0} minutes (must be > 0)")]
    InvalidVolatilityCheck(i64),
}

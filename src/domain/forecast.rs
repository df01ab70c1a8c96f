//! Forecast types
//!
//! One-step-ahead return and volatility forecast, plus the sampling
//! frequency that decides how the volatility is annualized.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Days per year used for annualization
const DAYS_PER_YEAR: f64 = 365.0;
/// Hours per day
const HOURS_PER_DAY: f64 = 24.0;
/// Minutes per hour
const MINUTES_PER_HOUR: f64 = 60.0;

/// Sampling frequency of the model data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataFrequency {
    #[default]
    #[serde(rename = "D", alias = "daily")]
    Daily,
    #[serde(rename = "H", alias = "hourly")]
    Hourly,
    #[serde(rename = "M", alias = "minute")]
    Minute,
}

impl DataFrequency {
    /// Number of sampling periods in one year
    pub fn periods_per_year(&self) -> f64 {
        match self {
            DataFrequency::Daily => DAYS_PER_YEAR,
            DataFrequency::Hourly => HOURS_PER_DAY * DAYS_PER_YEAR,
            DataFrequency::Minute => MINUTES_PER_HOUR * HOURS_PER_DAY * DAYS_PER_YEAR,
        }
    }

    /// Multiplier turning a per-period standard deviation into an annual one
    pub fn annualization_factor(&self) -> f64 {
        self.periods_per_year().sqrt()
    }

    /// Bucket width used when resampling model data
    pub fn period(&self) -> Duration {
        match self {
            DataFrequency::Daily => Duration::days(1),
            DataFrequency::Hourly => Duration::hours(1),
            DataFrequency::Minute => Duration::minutes(1),
        }
    }
}

/// One-step-ahead model forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Expected simple return over the next period
    pub return_forecast: f64,
    /// Annualized standard deviation of returns
    pub sd_forecast: f64,
}

impl ForecastResult {
    pub fn new(return_forecast: f64, sd_forecast: f64) -> Self {
        Self {
            return_forecast,
            sd_forecast,
        }
    }

    /// Return forecast limited to `±limit`
    pub fn clamped(self, limit: f64) -> Self {
        let return_forecast = if self.return_forecast.abs() > limit {
            self.return_forecast.signum() * limit
        } else {
            self.return_forecast
        };
        Self {
            return_forecast,
            ..self
        }
    }

    /// Both components are finite and the volatility is non-negative
    pub fn is_valid(&self) -> bool {
        self.return_forecast.is_finite() && self.sd_forecast.is_finite() && self.sd_forecast >= 0.0
    }
}

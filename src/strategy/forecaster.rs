//! Forecaster
//!
//! Turns the cleaned model data into a one-step-ahead return and annualized
//! volatility forecast at a given timepoint.
//!
//! Resampling is anchored on the timepoint: buckets are right-closed and
//! right-labelled, `(L - period, L]` with `L = timepoint - k * period`, and
//! keep the last price seen. Returns between consecutive non-empty buckets
//! inside the trailing window go to the estimator; its scaled output is
//! brought back to return units:
//!
//! - return = mean / scale
//! - sd = sqrt(periods_per_year) * sqrt(variance / scale^2)

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{CleanedObservation, DataFrequency, ForecastResult, StrategyError};
use crate::ports::{EstimationError, ModelSpec, ReturnModelEstimator};

/// At least two returns are needed to fit the AR(1) mean
pub const MIN_RETURNS: usize = 2;

/// Fits the return model on demand over the trailing window
#[derive(Debug)]
pub struct Forecaster<E> {
    model_data: Vec<CleanedObservation>,
    estimator: E,
    frequency: DataFrequency,
    window: Duration,
    spec: ModelSpec,
}

impl<E: ReturnModelEstimator> Forecaster<E> {
    pub fn new(model_data: Vec<CleanedObservation>, estimator: E, frequency: DataFrequency, window: Duration) -> Self {
        Self {
            model_data,
            estimator,
            frequency,
            window,
            spec: ModelSpec::default(),
        }
    }

    pub fn model_data(&self) -> &[CleanedObservation] {
        &self.model_data
    }

    pub fn frequency(&self) -> DataFrequency {
        self.frequency
    }

    /// Forecast for the period following `timepoint`
    pub fn forecast(&self, timepoint: DateTime<Utc>) -> Result<ForecastResult, StrategyError> {
        let returns = resample_returns(&self.model_data, timepoint, self.frequency.period(), self.window);
        if returns.len() < MIN_RETURNS {
            return Err(StrategyError::estimation(
                timepoint,
                EstimationError::InsufficientData {
                    required: MIN_RETURNS,
                    actual: returns.len(),
                },
            ));
        }

        let fitted = self
            .estimator
            .fit(&returns, &self.spec)
            .map_err(|e| StrategyError::estimation(timepoint, e))?;

        let step = fitted.forecast(1);
        let (Some(mean), Some(variance)) = (step.mean.first(), step.variance.first()) else {
            return Err(StrategyError::estimation(
                timepoint,
                EstimationError::NumericalInstability("estimator produced an empty forecast".to_string()),
            ));
        };

        let scale = fitted.scale;
        let result = ForecastResult::new(
            mean / scale,
            self.frequency.annualization_factor() * (variance / scale.powi(2)).sqrt(),
        );

        if !result.is_valid() {
            return Err(StrategyError::estimation(
                timepoint,
                EstimationError::NumericalInstability(format!(
                    "non-finite forecast: return {} sd {} (scale {scale})",
                    result.return_forecast, result.sd_forecast
                )),
            ));
        }

        debug!(
            %timepoint,
            returns = returns.len(),
            scale,
            iterations = fitted.iterations,
            return_forecast = result.return_forecast,
            sd_forecast = result.sd_forecast,
            "Model forecast generated"
        );

        Ok(result)
    }
}

/// Simple returns of the series resampled on `period` buckets anchored at
/// `timepoint`, restricted to bucket labels no older than `window`.
/// Oldest return first.
pub fn resample_returns(
    data: &[CleanedObservation],
    timepoint: DateTime<Utc>,
    period: Duration,
    window: Duration,
) -> Vec<f64> {
    let period_ms = period.num_milliseconds();
    if period_ms <= 0 {
        return Vec::new();
    }

    // bucket offset k -> (latest timestamp, price)
    let mut buckets: BTreeMap<i64, (DateTime<Utc>, f64)> = BTreeMap::new();
    for row in data.iter().filter(|row| row.timestamp <= timepoint) {
        let k = (timepoint - row.timestamp).num_milliseconds() / period_ms;
        buckets
            .entry(k)
            .and_modify(|slot| {
                if row.timestamp >= slot.0 {
                    *slot = (row.timestamp, row.price);
                }
            })
            .or_insert((row.timestamp, row.price));
    }

    let window_ms = window.num_milliseconds();
    let mut returns = Vec::with_capacity(buckets.len().saturating_sub(1));
    let mut previous: Option<f64> = None;

    // Largest offset is the oldest bucket
    for (k, (_, price)) in buckets.iter().rev() {
        if let Some(prev) = previous {
            if k * period_ms <= window_ms {
                returns.push(price / prev - 1.0);
            }
        }
        previous = Some(*price);
    }

    returns
}

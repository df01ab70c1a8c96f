//! Price samples fed to the forecasting model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamped price sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PriceObservation {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Sample that survived outlier filtering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanedObservation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    /// Simple return against the previous surviving sample; `None` for the first row
    pub price_return: Option<f64>,
}

impl From<&CleanedObservation> for PriceObservation {
    fn from(obs: &CleanedObservation) -> Self {
        PriceObservation::new(obs.timestamp, obs.price)
    }
}

//! Strategy Errors
//!
//! Every failure halts the current step and is handed back to the caller
//! with the numeric context needed to diagnose it.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ports::estimator::EstimationError;
use crate::strategy::params::ParameterError;

/// Which pool token a conservation check refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenIndex {
    Token0,
    Token1,
}

impl std::fmt::Display for TokenIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenIndex::Token0 => write!(f, "token_0"),
            TokenIndex::Token1 => write!(f, "token_1"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(
        "Alpha parameter {alpha:.3} too large for measured volatility, will lead to negative prices: \
         sd {sd_forecast:.3} band {band:.3} forecast {return_forecast:.3} current {price:.6} time {time}"
    )]
    AlphaParameter {
        alpha: f64,
        sd_forecast: f64,
        band: f64,
        return_forecast: f64,
        price: f64,
        time: DateTime<Utc>,
    },

    #[error(
        "Tau parameter {tau:.3} too large for measured volatility, will lead to negative prices: \
         sd {sd_forecast:.3} band {band:.3} forecast {return_forecast:.3} current {price:.6} time {time}"
    )]
    TauParameter {
        tau: f64,
        sd_forecast: f64,
        band: f64,
        return_forecast: f64,
        price: f64,
        time: DateTime<Utc>,
    },

    #[error("Range bounds inverted after tick snapping: lower tick {lower_tick} > upper tick {upper_tick} (prices {lower_price:.6} / {upper_price:.6})")]
    BoundsInverted {
        lower_tick: i32,
        upper_tick: i32,
        lower_price: f64,
        upper_price: f64,
    },

    #[error("Model forecast failed at {time}: {source}")]
    Estimation {
        time: DateTime<Utc>,
        #[source]
        source: EstimationError,
    },

    #[error("Token conservation violated for {token}: remaining {remaining} exceeds deposited {deposited}")]
    ConservationViolated {
        token: TokenIndex,
        deposited: f64,
        remaining: f64,
    },

    #[error("Invalid price for tick conversion: {price}")]
    InvalidPrice { price: f64 },

    #[error("Invalid tick spacing: {0}")]
    InvalidTickSpacing(i32),

    #[error("Invalid strategy parameters: {0}")]
    InvalidParameters(#[from] ParameterError),

    #[error("Strategy state missing: {0}")]
    MissingState(&'static str),
}

impl StrategyError {
    /// Wrap an estimator failure with the timepoint it was produced for
    pub fn estimation(time: DateTime<Utc>, source: EstimationError) -> Self {
        StrategyError::Estimation { time, source }
    }

    /// Failure repeats on every step until the strategy is reconfigured
    pub fn is_parameter_failure(&self) -> bool {
        matches!(
            self,
            StrategyError::AlphaParameter { .. }
                | StrategyError::TauParameter { .. }
                | StrategyError::InvalidParameters(_)
        )
    }
}

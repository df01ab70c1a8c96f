//! Return model estimation port
//!
//! The strategy needs an AR(1) mean with GARCH(1,1) residual variance,
//! fitted to a return series with automatic rescaling. How the fit is
//! obtained is up to the implementation; the strategy only consumes the
//! fitted parameters and the last filtered state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model specification handed to the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Autoregressive lags in the mean equation
    pub lags: usize,
    /// Rescale the data so its variance is numerically friendly
    pub rescale: bool,
    /// GARCH lag order of squared residuals
    pub p: usize,
    /// GARCH lag order of conditional variance
    pub q: usize,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            lags: 1,
            rescale: true,
            p: 1,
            q: 1,
        }
    }
}

/// AR(1)-GARCH(1,1) parameters in scaled units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArGarchParams {
    /// Mean constant
    pub constant: f64,
    /// AR(1) coefficient
    pub ar: f64,
    /// Variance intercept
    pub omega: f64,
    /// ARCH coefficient on squared residuals
    pub alpha: f64,
    /// GARCH coefficient on lagged variance
    pub beta: f64,
}

impl ArGarchParams {
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Long-run variance, `None` if the process is not covariance stationary
    pub fn unconditional_variance(&self) -> Option<f64> {
        let persistence = self.persistence();
        if persistence < 1.0 {
            Some(self.omega / (1.0 - persistence))
        } else {
            None
        }
    }
}

/// Multi-step forecast in scaled units
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    /// Conditional mean per step
    pub mean: Vec<f64>,
    /// Conditional residual variance per step
    pub variance: Vec<f64>,
}

/// Fitted model with the state needed to forecast forward
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    /// Factor the data was multiplied by before fitting
    pub scale: f64,
    pub params: ArGarchParams,
    /// Last observed (scaled) return
    pub last_value: f64,
    /// Last in-sample residual
    pub last_residual: f64,
    /// Last in-sample conditional variance
    pub last_variance: f64,
    pub log_likelihood: f64,
    pub iterations: usize,
}

impl FittedModel {
    /// Forecast `horizon` steps past the end of the sample
    pub fn forecast(&self, horizon: usize) -> ModelForecast {
        let p = &self.params;
        let mut mean = Vec::with_capacity(horizon);
        let mut variance = Vec::with_capacity(horizon);

        let mut prev_mean = self.last_value;
        let mut prev_var = 0.0;
        for step in 0..horizon {
            let m = p.constant + p.ar * prev_mean;
            let v = if step == 0 {
                p.omega + p.alpha * self.last_residual.powi(2) + p.beta * self.last_variance
            } else {
                p.omega + p.persistence() * prev_var
            };
            mean.push(m);
            variance.push(v);
            prev_mean = m;
            prev_var = v;
        }

        ModelForecast { mean, variance }
    }
}

/// Estimation failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EstimationError {
    #[error("Insufficient data for estimation: requires {required} returns, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Degenerate estimation window: sample variance {variance:e}")]
    DegenerateWindow { variance: f64 },

    #[error("Estimator failed to converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    #[error("Unsupported model specification: {0:?}")]
    UnsupportedModel(ModelSpec),
}

/// Fits the return model
#[cfg_attr(test, mockall::automock)]
pub trait ReturnModelEstimator {
    fn fit(&self, returns: &[f64], spec: &ModelSpec) -> Result<FittedModel, EstimationError>;
}

//! AR(1)-GARCH(1,1) Maximum Likelihood Estimator
//!
//! Mean:      y_t = c + phi * y_{t-1} + e_t
//! Variance:  s2_t = omega + alpha * e_{t-1}^2 + beta * s2_{t-1}
//!
//! Gaussian quasi-likelihood, maximized with Nelder-Mead over an
//! unconstrained reparameterization that keeps the model stationary:
//! - phi = 0.999 * tanh(a)
//! - omega = exp(w)
//! - alpha + beta = 0.999 * sigmoid(p), alpha = (alpha + beta) * sigmoid(s)
//!
//! With rescaling enabled the returns are multiplied by powers of ten until
//! the variance of the first-stage AR(1) residuals lies in [0.1, 10000). The first variance is seeded by an
//! exponentially weighted backcast of the squared OLS residuals.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::ports::{ArGarchParams, EstimationError, FittedModel, ModelSpec, ReturnModelEstimator};

/// ln(2 * pi)
const LN_2PI: f64 = 1.837_877_066_409_345_5;
/// Keeps |phi| and alpha + beta strictly below one
const STATIONARITY_BOUND: f64 = 0.999;
/// Rescaled sample variance must land in [MIN_SCALED_VARIANCE, MAX_SCALED_VARIANCE)
const MIN_SCALED_VARIANCE: f64 = 0.1;
const MAX_SCALED_VARIANCE: f64 = 10_000.0;
const MAX_RESCALE_STEPS: usize = 64;
/// Backcast decay and length
const BACKCAST_DECAY: f64 = 0.94;
const BACKCAST_WINDOW: usize = 75;
/// Starting values for the variance equation
const START_ALPHA: f64 = 0.05;
const START_BETA: f64 = 0.90;
const START_AR_LIMIT: f64 = 0.95;
/// Initial simplex edge in the unconstrained space
const SIMPLEX_STEP: f64 = 0.25;
/// Box for each unconstrained coordinate [c, a, w, p, s]
const BOUNDS: [(f64, f64); 5] = [(-1e3, 1e3), (-10.0, 10.0), (-30.0, 15.0), (-15.0, 15.0), (-15.0, 15.0)];

pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;
pub const DEFAULT_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_MIN_OBSERVATIONS: usize = 20;

/// Estimator tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GarchConfig {
    /// Nelder-Mead iteration cap
    pub max_iterations: usize,
    /// Relative likelihood spread at which the simplex counts as converged
    pub tolerance: f64,
    /// Fewer returns than this are rejected
    pub min_observations: usize,
}

impl Default for GarchConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
        }
    }
}

/// Gaussian quasi-MLE for the AR(1)-GARCH(1,1) return model
#[derive(Debug, Clone, Default)]
pub struct GarchMle {
    config: GarchConfig,
}

impl GarchMle {
    pub fn new(config: GarchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GarchConfig {
        &self.config
    }
}

impl ReturnModelEstimator for GarchMle {
    fn fit(&self, returns: &[f64], spec: &ModelSpec) -> Result<FittedModel, EstimationError> {
        if spec.lags != 1 || spec.p != 1 || spec.q != 1 {
            return Err(EstimationError::UnsupportedModel(*spec));
        }
        let required = self.config.min_observations.max(3);
        if returns.len() < required {
            return Err(EstimationError::InsufficientData {
                required,
                actual: returns.len(),
            });
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(EstimationError::NumericalInstability(
                "non-finite value in return series".to_string(),
            ));
        }

        let variance = returns.iter().population_variance();
        if !(variance > 0.0) || !variance.is_finite() {
            return Err(EstimationError::DegenerateWindow { variance });
        }

        // First-stage AR(1) fit on raw returns; its residual variance picks the scale
        let (raw_constant, ar) = ols_ar1(returns);
        let raw_residuals = ar1_residuals(returns, raw_constant, ar);
        let raw_resid_variance = raw_residuals.iter().population_variance();
        if !(raw_resid_variance > 0.0) || !raw_resid_variance.is_finite() {
            return Err(EstimationError::DegenerateWindow {
                variance: raw_resid_variance,
            });
        }

        let scale = if spec.rescale { rescale_factor(raw_resid_variance)? } else { 1.0 };
        let y: Vec<f64> = returns.iter().map(|r| r * scale).collect();
        let constant = raw_constant * scale;
        let residuals: Vec<f64> = raw_residuals.iter().map(|e| e * scale).collect();
        let backcast = backcast(&residuals);
        let resid_variance = raw_resid_variance * scale * scale;

        let start = ArGarchParams {
            constant,
            ar: ar.clamp(-START_AR_LIMIT, START_AR_LIMIT),
            omega: resid_variance * (1.0 - START_ALPHA - START_BETA),
            alpha: START_ALPHA,
            beta: START_BETA,
        };
        let theta0 = to_unconstrained(&start);

        let objective = |theta: &[f64]| {
            filter(&y, &from_unconstrained(theta), backcast)
                .map(|state| state.nll)
                .unwrap_or(f64::INFINITY)
        };
        if !objective(&theta0).is_finite() {
            return Err(EstimationError::NumericalInstability(
                "likelihood not finite at starting values".to_string(),
            ));
        }

        let optimum = nelder_mead(objective, &theta0, self.config.max_iterations, self.config.tolerance)
            .map_err(|iterations| EstimationError::NonConvergence { iterations })?;

        let params = from_unconstrained(&optimum.x);
        let state = filter(&y, &params, backcast).ok_or_else(|| {
            EstimationError::NumericalInstability(format!("variance recursion failed at optimum {params:?}"))
        })?;

        let last_value = y[y.len() - 1];
        let fitted = FittedModel {
            scale,
            params,
            last_value,
            last_residual: state.last_residual,
            last_variance: state.last_variance,
            log_likelihood: -state.nll,
            iterations: optimum.iterations,
        };

        debug!(
            observations = returns.len(),
            scale,
            constant = params.constant,
            ar = params.ar,
            omega = params.omega,
            alpha = params.alpha,
            beta = params.beta,
            log_likelihood = fitted.log_likelihood,
            iterations = optimum.iterations,
            "AR-GARCH model fitted"
        );

        Ok(fitted)
    }
}

/// Power of ten that moves `variance * factor^2` into the target band
fn rescale_factor(variance: f64) -> Result<f64, EstimationError> {
    let mut factor = 1.0;
    let mut scaled = variance;
    let mut steps = 0;
    while !(MIN_SCALED_VARIANCE..MAX_SCALED_VARIANCE).contains(&scaled) {
        if steps == MAX_RESCALE_STEPS {
            return Err(EstimationError::DegenerateWindow { variance });
        }
        if scaled < 1.0 {
            factor *= 10.0;
        } else {
            factor /= 10.0;
        }
        scaled = variance * factor * factor;
        steps += 1;
    }
    Ok(factor)
}

/// Least squares fit of y_t on y_{t-1}
fn ols_ar1(y: &[f64]) -> (f64, f64) {
    let lagged = &y[..y.len() - 1];
    let current = &y[1..];
    let mean_x = lagged.iter().mean();
    let mean_y = current.iter().mean();

    let (cov, var_x) = lagged
        .iter()
        .zip(current)
        .fold((0.0, 0.0), |(cov, var), (x, y)| {
            (cov + (x - mean_x) * (y - mean_y), var + (x - mean_x).powi(2))
        });

    let ar = if var_x > 0.0 { cov / var_x } else { 0.0 };
    (mean_y - ar * mean_x, ar)
}

fn ar1_residuals(y: &[f64], constant: f64, ar: f64) -> Vec<f64> {
    y.windows(2).map(|w| w[1] - constant - ar * w[0]).collect()
}

/// Exponentially weighted mean of the leading squared residuals
fn backcast(residuals: &[f64]) -> f64 {
    let window = residuals.len().min(BACKCAST_WINDOW);
    let mut weight = 1.0;
    let mut total_weight = 0.0;
    let mut acc = 0.0;
    for e in &residuals[..window] {
        acc += weight * e * e;
        total_weight += weight;
        weight *= BACKCAST_DECAY;
    }
    acc / total_weight
}

/// End state of the variance recursion
struct FilterState {
    nll: f64,
    last_residual: f64,
    last_variance: f64,
}

/// Run the mean and variance recursions; `None` when a variance is not positive
fn filter(y: &[f64], params: &ArGarchParams, backcast: f64) -> Option<FilterState> {
    let mut prev_resid_sq = backcast;
    let mut prev_variance = backcast;
    let mut nll = 0.0;
    let mut last_residual = 0.0;

    for w in y.windows(2) {
        let residual = w[1] - params.constant - params.ar * w[0];
        let variance = params.omega + params.alpha * prev_resid_sq + params.beta * prev_variance;
        if !(variance > 0.0) || !variance.is_finite() {
            return None;
        }
        nll += 0.5 * (LN_2PI + variance.ln() + residual * residual / variance);
        prev_resid_sq = residual * residual;
        prev_variance = variance;
        last_residual = residual;
    }

    nll.is_finite().then_some(FilterState {
        nll,
        last_residual,
        last_variance: prev_variance,
    })
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

fn from_unconstrained(theta: &[f64]) -> ArGarchParams {
    let persistence = STATIONARITY_BOUND * sigmoid(theta[3]);
    let alpha = persistence * sigmoid(theta[4]);
    ArGarchParams {
        constant: theta[0],
        ar: STATIONARITY_BOUND * theta[1].tanh(),
        omega: theta[2].exp(),
        alpha,
        beta: persistence - alpha,
    }
}

fn to_unconstrained(params: &ArGarchParams) -> [f64; 5] {
    let persistence = params.alpha + params.beta;
    [
        params.constant,
        (params.ar / STATIONARITY_BOUND).atanh(),
        params.omega.ln(),
        logit(persistence / STATIONARITY_BOUND),
        logit(params.alpha / persistence),
    ]
}

struct Optimum {
    x: Vec<f64>,
    iterations: usize,
}

fn project(x: &mut [f64]) {
    for (v, (lo, hi)) in x.iter_mut().zip(BOUNDS) {
        *v = v.clamp(lo, hi);
    }
}

/// Box-projected Nelder-Mead minimizer. Err carries the iterations spent.
fn nelder_mead<F>(objective: F, start: &[f64], max_iterations: usize, tolerance: f64) -> Result<Optimum, usize>
where
    F: Fn(&[f64]) -> f64,
{
    let n = start.len();
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    let mut origin = start.to_vec();
    project(&mut origin);
    simplex.push((origin.clone(), eval(&origin)));
    for i in 0..n {
        let mut x = origin.clone();
        let upper = BOUNDS.get(i).map_or(f64::INFINITY, |b| b.1);
        x[i] += if x[i] + SIMPLEX_STEP <= upper { SIMPLEX_STEP } else { -SIMPLEX_STEP };
        let f = eval(&x);
        simplex.push((x, f));
    }

    let x_tolerance = tolerance.sqrt();
    for iteration in 0..max_iterations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[n].1;
        let second_worst = simplex[n - 1].1;

        let x_spread = simplex[1..]
            .iter()
            .flat_map(|(x, _)| x.iter().zip(&simplex[0].0).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        if best.is_finite() && (worst - best).abs() <= tolerance * (1.0 + best.abs()) && x_spread <= x_tolerance {
            return Ok(Optimum {
                x: simplex[0].0.clone(),
                iterations: iteration,
            });
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|(x, _)| x[j]).sum::<f64>() / n as f64)
            .collect();
        let worst_x = simplex[n].0.clone();
        let toward = |coef: f64| {
            let mut x: Vec<f64> = centroid
                .iter()
                .zip(&worst_x)
                .map(|(c, w)| c + coef * (c - w))
                .collect();
            project(&mut x);
            let f = eval(&x);
            (x, f)
        };

        let reflected = toward(1.0);
        if reflected.1 < best {
            let expanded = toward(2.0);
            simplex[n] = if expanded.1 < reflected.1 { expanded } else { reflected };
        } else if reflected.1 < second_worst {
            simplex[n] = reflected;
        } else {
            let contracted = if reflected.1 < worst { toward(0.5) } else { toward(-0.5) };
            if contracted.1 < reflected.1.min(worst) {
                simplex[n] = contracted;
            } else {
                let best_x = simplex[0].0.clone();
                for vertex in simplex.iter_mut().skip(1) {
                    let x: Vec<f64> = best_x
                        .iter()
                        .zip(&vertex.0)
                        .map(|(b, v)| b + 0.5 * (v - b))
                        .collect();
                    let f = eval(&x);
                    *vertex = (x, f);
                }
            }
        }
    }

    Err(max_iterations)
}

//! Shared fixtures and hand-written port fakes for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use butters_ar_range::adapters::UniswapV3Math;
use butters_ar_range::domain::{raw_tick, PoolGeometry, PriceObservation, StrategyObservation};
use butters_ar_range::ports::{
    AmmMath, ArGarchParams, EstimationError, FittedModel, GapFiller, LiquidityManager, ModelSpec,
    ReturnModelEstimator,
};
use butters_ar_range::strategy::RebalanceOutcome;
use butters_ar_range::{AutoRegressiveStrategy, StrategyError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

// ============================================================================
// Test Fixtures
// ============================================================================

pub const DAYS_PER_YEAR: f64 = 365.0;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()
}

/// 18/18 decimal pool with spacing 60
pub fn pool() -> PoolGeometry {
    PoolGeometry::new(60, 18, 18)
}

/// Observation holding only deposits
pub fn observation(time: DateTime<Utc>, price: f64, liquidity_in_0: f64, liquidity_in_1: f64) -> StrategyObservation {
    let pool = pool();
    let tick = raw_tick(price, pool.decimal_adjustment).unwrap();
    StrategyObservation::new(time, price, tick, pool, liquidity_in_0, liquidity_in_1)
}

/// Move the observation to a new time and price
pub fn advance(observation: &mut StrategyObservation, time: DateTime<Utc>, price: f64) {
    observation.time = time;
    observation.price = price;
    observation.price_tick = raw_tick(price, observation.pool.decimal_adjustment).unwrap();
}

/// Daily prices around `level` with a small repeating pattern
pub fn daily_history(days: i64, level: f64) -> Vec<PriceObservation> {
    (0..days)
        .map(|i| PriceObservation::new(start_time() + Duration::days(i), level * (1.0 + 0.01 * (i % 4) as f64)))
        .collect()
}

/// Hourly geometric random walk with the given daily volatility
pub fn synthetic_history(days: i64, start_price: f64, daily_vol: f64, seed: u64) -> Vec<PriceObservation> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, daily_vol / 24f64.sqrt()).unwrap();
    let mut price = start_price;
    (0..days * 24)
        .map(|h| {
            let obs = PriceObservation::new(start_time() + Duration::hours(h), price);
            price *= normal.sample(&mut rng).exp();
            obs
        })
        .collect()
}

// ============================================================================
// Port Fakes
// ============================================================================

/// Gap filler that returns the series unchanged
#[derive(Debug, Default)]
pub struct PassThroughFiller;

impl GapFiller for PassThroughFiller {
    fn fill_time(&self, series: &[PriceObservation]) -> Vec<PriceObservation> {
        series.to_vec()
    }
}

/// Estimator with a scripted forecast that counts its fits
#[derive(Debug, Clone)]
pub struct ScriptedEstimator {
    /// (return per period, annualized sd)
    forecast: Arc<Mutex<(f64, f64)>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedEstimator {
    pub fn new(return_forecast: f64, annual_sd: f64) -> Self {
        Self {
            forecast: Arc::new(Mutex::new((return_forecast, annual_sd))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change the forecast for subsequent fits
    pub fn set_forecast(&self, return_forecast: f64, annual_sd: f64) {
        *self.forecast.lock().unwrap() = (return_forecast, annual_sd);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReturnModelEstimator for ScriptedEstimator {
    fn fit(&self, returns: &[f64], _spec: &ModelSpec) -> Result<FittedModel, EstimationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (mean, annual_sd) = *self.forecast.lock().unwrap();
        let period_sd = annual_sd / DAYS_PER_YEAR.sqrt();
        Ok(FittedModel {
            scale: 1.0,
            params: ArGarchParams {
                constant: mean,
                ar: 0.0,
                omega: period_sd * period_sd,
                alpha: 0.0,
                beta: 0.0,
            },
            last_value: returns.last().copied().unwrap_or(0.0),
            last_residual: 0.0,
            last_variance: period_sd * period_sd,
            log_likelihood: 0.0,
            iterations: 0,
        })
    }
}

/// Liquidity manager that withdraws every range at the current tick,
/// collects uncollected fees and returns everything to the deposits
#[derive(Debug, Default)]
pub struct HarnessManager {
    amm: UniswapV3Math,
    pub removals: usize,
    /// Deposits after the last withdrawal
    pub withdrawn: Option<(f64, f64)>,
}

impl LiquidityManager for HarnessManager {
    fn remove_liquidity(&mut self, observation: &mut StrategyObservation) {
        self.removals += 1;

        let mut token_0 = observation.token_0_left_over + observation.fees.token_0_fees_uncollected;
        let mut token_1 = observation.token_1_left_over + observation.fees.token_1_fees_uncollected;
        if let Some(ranges) = observation.liquidity_ranges.as_ref() {
            for range in ranges.iter() {
                let (a0, a1) = self.amm.get_amounts(
                    observation.price_tick,
                    range.ticks(),
                    range.position_liquidity,
                    observation.pool.decimals(),
                );
                token_0 += a0;
                token_1 += a1;
            }
        }

        observation.fees.token_0_fees += observation.fees.token_0_fees_uncollected;
        observation.fees.token_1_fees += observation.fees.token_1_fees_uncollected;
        observation.fees.token_0_fees_uncollected = 0.0;
        observation.fees.token_1_fees_uncollected = 0.0;
        observation.token_0_left_over = 0.0;
        observation.token_1_left_over = 0.0;
        observation.liquidity_in_0 += token_0;
        observation.liquidity_in_1 += token_1;

        self.withdrawn = Some((observation.liquidity_in_0, observation.liquidity_in_1));
    }
}

/// Run one harness step and install whatever the strategy returns
pub fn step<E, A>(
    strategy: &AutoRegressiveStrategy<E, A>,
    observation: &mut StrategyObservation,
    manager: &mut HarnessManager,
) -> Result<RebalanceOutcome, StrategyError>
where
    E: ReturnModelEstimator,
    A: AmmMath,
{
    let outcome = strategy.check_strategy(observation, manager)?;
    outcome.allocation.clone().install(observation);
    Ok(outcome)
}

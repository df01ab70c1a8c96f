//! AutoRegressive Range Strategy
//!
//! Entry point for the simulation harness. Owns the cleaned model data, the
//! estimator and the AMM math, and runs one rebalance decision per step:
//!
//! 1. Evaluate the reset conditions against the placed ranges
//! 2. On reset, label it, ask the harness to pull liquidity, then re-allocate
//!    reusing the forecast fitted for the volatility check
//! 3. Otherwise hand back the current ranges untouched

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{
    CleanedObservation, ForecastResult, PriceObservation, ResetReason, StrategyError, StrategyObservation,
};
use crate::ports::{AmmMath, GapFiller, LiquidityManager, ReturnModelEstimator};
use crate::strategy::allocator::{Allocation, RangeAllocator};
use crate::strategy::data_cleaner::clean_for_garch;
use crate::strategy::forecaster::Forecaster;
use crate::strategy::metrics::{strategy_metrics, StrategyMetrics};
use crate::strategy::params::StrategyParameters;
use crate::strategy::rebalance::{self, ResetConditions};

/// Result of one `check_strategy` step
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceOutcome {
    /// `Some` when the ranges were re-placed
    pub reset_reason: Option<ResetReason>,
    pub conditions: ResetConditions,
    /// New ranges after a reset, the current ones otherwise
    pub allocation: Allocation,
}

impl RebalanceOutcome {
    pub fn is_reset(&self) -> bool {
        self.reset_reason.is_some()
    }
}

/// AR(1)-GARCH(1,1) driven concentrated liquidity strategy
pub struct AutoRegressiveStrategy<E, A> {
    params: StrategyParameters,
    forecaster: Forecaster<E>,
    amm: A,
}

impl<E, A> AutoRegressiveStrategy<E, A>
where
    E: ReturnModelEstimator,
    A: AmmMath,
{
    /// Clean `model_data` once and validate the parameters
    pub fn new<F>(
        model_data: &[PriceObservation],
        filler: &F,
        params: StrategyParameters,
        estimator: E,
        amm: A,
    ) -> Result<Self, StrategyError>
    where
        F: GapFiller + ?Sized,
    {
        params.validate()?;
        let window = params.forecast_window()?;
        let cleaned = clean_for_garch(model_data, filler, params.z_score_cutoff);

        info!(
            alpha = params.alpha,
            tau = params.tau,
            volatility_reset_ratio = params.volatility_reset_ratio,
            tokens_outside_reset = params.tokens_outside_reset,
            frequency = ?params.data_frequency,
            samples = cleaned.len(),
            "Autoregressive strategy initialized"
        );

        let forecaster = Forecaster::new(cleaned, estimator, params.data_frequency, window);
        Ok(Self {
            params,
            forecaster,
            amm,
        })
    }

    pub fn params(&self) -> &StrategyParameters {
        &self.params
    }

    /// Cleaned model data the forecasts are fitted on
    pub fn model_data(&self) -> &[CleanedObservation] {
        self.forecaster.model_data()
    }

    pub fn generate_model_forecast(&self, timepoint: DateTime<Utc>) -> Result<ForecastResult, StrategyError> {
        self.forecaster.forecast(timepoint)
    }

    /// Decide whether to reset and, if so, re-place liquidity
    pub fn check_strategy<M>(
        &self,
        observation: &mut StrategyObservation,
        manager: &mut M,
    ) -> Result<RebalanceOutcome, StrategyError>
    where
        M: LiquidityManager + ?Sized,
    {
        let evaluation = rebalance::evaluate(observation, &self.params, |t| self.generate_model_forecast(t))?;
        let conditions = evaluation.conditions;

        let Some(reason) = conditions.reason() else {
            observation.reset_point = false;
            observation.reset_reason = None;
            let allocation = Allocation {
                ranges: observation.ranges()?.clone(),
                strategy_info: *observation.info()?,
            };
            return Ok(RebalanceOutcome {
                reset_reason: None,
                conditions,
                allocation,
            });
        };

        info!(
            time = %observation.time,
            price = observation.price,
            reason = %reason,
            "Reset triggered"
        );

        observation.reset_point = true;
        observation.reset_reason = Some(reason);
        manager.remove_liquidity(observation);

        let allocation = self.set_liquidity_ranges(observation, evaluation.forecast)?;
        Ok(RebalanceOutcome {
            reset_reason: Some(reason),
            conditions,
            allocation,
        })
    }

    /// Allocate the observation's deposits, fitting a forecast if none is given
    pub fn set_liquidity_ranges(
        &self,
        observation: &mut StrategyObservation,
        forecast: Option<ForecastResult>,
    ) -> Result<Allocation, StrategyError> {
        let forecast = match forecast {
            Some(f) => f,
            None => self.generate_model_forecast(observation.time)?,
        };
        RangeAllocator::new(&self.params, &self.amm).allocate(observation, forecast)
    }

    pub fn metrics(&self, observation: &StrategyObservation) -> Result<StrategyMetrics, StrategyError> {
        strategy_metrics(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{price_to_tick, PoolGeometry};
    use crate::ports::amm::MockAmmMath;
    use crate::ports::estimator::{ArGarchParams, FittedModel, MockReturnModelEstimator};
    use crate::ports::execution::MockLiquidityManager;
    use crate::ports::market_data::MockGapFiller;
    use crate::strategy::params::ParameterError;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()
    }

    fn daily_history() -> Vec<PriceObservation> {
        (0..60)
            .map(|i| PriceObservation::new(start() + Duration::days(i), 100.0 + (i % 5) as f64))
            .collect()
    }

    fn passthrough() -> MockGapFiller {
        let mut filler = MockGapFiller::new();
        filler.expect_fill_time().returning(|s| s.to_vec());
        filler
    }

    /// Estimator whose forecast is exactly `sd_daily` per period with zero mean
    fn estimator(sd_daily: f64) -> MockReturnModelEstimator {
        let mut estimator = MockReturnModelEstimator::new();
        estimator.expect_fit().returning(move |_, _| {
            Ok(FittedModel {
                scale: 1.0,
                params: ArGarchParams {
                    constant: 0.0,
                    ar: 0.0,
                    omega: sd_daily * sd_daily,
                    alpha: 0.0,
                    beta: 0.0,
                },
                last_value: 0.0,
                last_residual: 0.0,
                last_variance: 0.0,
                log_likelihood: 0.0,
                iterations: 1,
            })
        });
        estimator
    }

    fn amm() -> MockAmmMath {
        let mut amm = MockAmmMath::new();
        amm.expect_get_liquidity().returning(|_, _, _, _, _| 1);
        amm.expect_get_amounts().returning(|_, _, _, _| (0.5, 50.0));
        amm
    }

    fn observation(time: DateTime<Utc>, price: f64) -> StrategyObservation {
        StrategyObservation::new(time, price, price_to_tick(price, 1.0, 1).unwrap(), PoolGeometry::new(10, 18, 18), 1.0, 100.0)
    }

    fn strategy(sd_daily: f64) -> AutoRegressiveStrategy<MockReturnModelEstimator, MockAmmMath> {
        AutoRegressiveStrategy::new(
            &daily_history(),
            &passthrough(),
            StrategyParameters::new(2.0, 2.5, 0.8),
            estimator(sd_daily),
            amm(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        let result = AutoRegressiveStrategy::new(
            &daily_history(),
            &passthrough(),
            StrategyParameters::new(-1.0, 2.5, 0.8),
            estimator(0.01),
            amm(),
        );
        assert!(matches!(
            result,
            Err(StrategyError::InvalidParameters(ParameterError::InvalidAlpha(_)))
        ));
    }

    #[test]
    fn test_new_rejects_unrepresentable_window() {
        let params = StrategyParameters::new(2.0, 2.5, 0.8).with_forecast_window_days(1_000_000_000_000_000_000);
        let result = AutoRegressiveStrategy::new(&daily_history(), &passthrough(), params, estimator(0.01), amm());
        assert!(matches!(
            result,
            Err(StrategyError::InvalidParameters(ParameterError::InvalidForecastWindow(_)))
        ));
    }

    #[test]
    fn test_initial_allocation_fits_forecast() {
        let strat = strategy(0.01);
        assert_eq!(strat.model_data().len(), 60);

        let mut obs = observation(start() + Duration::days(59), 100.0);
        let alloc = strat.set_liquidity_ranges(&mut obs, None).unwrap();
        let expected_sd = 365f64.sqrt() * 0.01;
        assert!((alloc.ranges.base.volatility - expected_sd).abs() < 1e-12);
        assert_eq!(obs.liquidity_in_0, 0.0);
    }

    #[test]
    fn test_hold_returns_current_ranges() {
        let strat = strategy(0.01);
        let placed_at = start() + Duration::days(59);
        let mut obs = observation(placed_at, 100.0);
        strat.set_liquidity_ranges(&mut obs, None).unwrap().install(&mut obs);
        obs.token_0_left_over = 0.0;
        obs.token_1_left_over = 0.0;

        // 30 minutes later: no volatility check, price inside band
        obs.time = placed_at + Duration::minutes(30);
        let mut manager = MockLiquidityManager::new();
        manager.expect_remove_liquidity().never();

        let outcome = strat.check_strategy(&mut obs, &mut manager).unwrap();
        assert!(!outcome.is_reset());
        assert!(!obs.reset_point);
        assert_eq!(obs.reset_reason, None);
        assert_eq!(&outcome.allocation.ranges, obs.ranges().unwrap());
    }

    #[test]
    fn test_exit_triggers_reset() {
        let strat = strategy(0.01);
        let placed_at = start() + Duration::days(59);
        let mut obs = observation(placed_at, 100.0);
        strat.set_liquidity_ranges(&mut obs, None).unwrap().install(&mut obs);

        obs.time = placed_at + Duration::minutes(61);
        obs.price = 150.0;
        obs.price_tick = price_to_tick(150.0, 1.0, 1).unwrap();

        let mut manager = MockLiquidityManager::new();
        manager.expect_remove_liquidity().times(1).returning(|o| {
            o.liquidity_in_0 = 1.0;
            o.liquidity_in_1 = 100.0;
        });

        let outcome = strat.check_strategy(&mut obs, &mut manager).unwrap();
        assert_eq!(outcome.reset_reason, Some(ResetReason::ExitedRange));
        assert!(obs.reset_point);
        assert_eq!(obs.reset_reason, Some(ResetReason::ExitedRange));
        assert_eq!(outcome.allocation.ranges.base.price, 150.0);
        assert_eq!(outcome.allocation.ranges.base.reset_time, obs.time);
    }

    #[test]
    fn test_metrics_delegates() {
        let strat = strategy(0.01);
        let mut obs = observation(start() + Duration::days(59), 100.0);
        assert!(strat.metrics(&obs).is_err());
        strat.set_liquidity_ranges(&mut obs, None).unwrap().install(&mut obs);
        let metrics = strat.metrics(&obs).unwrap();
        assert_eq!(metrics.base_token_1, 50.0);
    }
}

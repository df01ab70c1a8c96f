//! Range Allocator
//!
//! Converts a forecast into a base range and a single-sided limit range.
//!
//! Base range:  price * (1 + r -/+ alpha * sd)
//! Reset band:  price * (1 + r -/+ tau * sd)
//! Limit range: [price, base_upper] holding token 0, or [base_lower, price]
//!              holding token 1, whichever left-over is worth more
//!
//! All deposited tokens are offered to the base range first; what the AMM
//! does not consume goes to the limit range, and the rest stays idle.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::{
    snap_range, ForecastResult, LiquidityRange, RangePair, RangeRepair, StrategyError, StrategyInfo,
    StrategyObservation, TickRange, TokenIndex,
};
use crate::ports::AmmMath;
use crate::strategy::params::StrategyParameters;

/// Freshly placed ranges and the reset band that goes with them
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub ranges: RangePair,
    pub strategy_info: StrategyInfo,
}

impl Allocation {
    /// Store the ranges and reset band on the observation
    pub fn install(self, observation: &mut StrategyObservation) {
        observation.liquidity_ranges = Some(self.ranges);
        observation.strategy_info = Some(self.strategy_info);
    }
}

/// Places liquidity ranges with the configured alpha/tau
pub struct RangeAllocator<'a, A: ?Sized> {
    params: &'a StrategyParameters,
    amm: &'a A,
}

impl<'a, A: AmmMath + ?Sized> RangeAllocator<'a, A> {
    pub fn new(params: &'a StrategyParameters, amm: &'a A) -> Self {
        Self { params, amm }
    }

    /// Allocate all deposits in `observation` around `forecast`.
    ///
    /// Left-over tokens are written back to the observation and the deposit
    /// totals are zeroed. The caller installs the returned ranges.
    pub fn allocate(
        &self,
        observation: &mut StrategyObservation,
        forecast: ForecastResult,
    ) -> Result<Allocation, StrategyError> {
        let forecast = forecast.clamped(self.params.return_clamp);
        let r = forecast.return_forecast;
        let sd = forecast.sd_forecast;
        let price = observation.price;
        let time = observation.time;

        let target_price = price * (1.0 + r);
        self.check_bands(forecast, price, time)?;

        let base_lower = price * (1.0 + r - self.params.alpha * sd);
        let base_upper = price * (1.0 + r + self.params.alpha * sd);
        let strategy_info = StrategyInfo::new(
            price * (1.0 + r - self.params.tau * sd),
            price * (1.0 + r + self.params.tau * sd),
        );

        let pool = observation.pool;
        let decimals = pool.decimals();
        let deposited_0 = observation.liquidity_in_0;
        let deposited_1 = observation.liquidity_in_1;

        // Base range
        let base_ticks = snap_range(
            base_lower,
            base_upper,
            pool.decimal_adjustment,
            pool.tick_spacing,
            RangeRepair::WidenOrReject,
        )?;
        let base_liquidity =
            self.amm
                .get_liquidity(observation.price_tick, base_ticks, deposited_0, deposited_1, decimals);
        let (base_0, base_1) = self
            .amm
            .get_amounts(observation.price_tick, base_ticks, base_liquidity, decimals);

        let mut remaining_0 = deposited_0 - base_0;
        let mut remaining_1 = deposited_1 - base_1;

        debug!(
            lower = base_lower,
            upper = base_upper,
            lower_tick = base_ticks.lower,
            upper_tick = base_ticks.upper,
            token_0 = base_0,
            token_1 = base_1,
            liquidity = base_liquidity,
            "Base range sized"
        );

        // Limit range, single-sided in whichever token is worth more
        let (limit_lower, limit_upper, limit_in_0, limit_in_1, repair) = if remaining_0 * price > remaining_1 {
            (price, base_upper, remaining_0, 0.0, RangeRepair::ExtendUpper)
        } else {
            (base_lower, price, 0.0, remaining_1, RangeRepair::ExtendLower)
        };

        let limit_ticks = snap_range(
            limit_lower,
            limit_upper,
            pool.decimal_adjustment,
            pool.tick_spacing,
            repair,
        )?;
        let limit_liquidity =
            self.amm
                .get_liquidity(observation.price_tick, limit_ticks, limit_in_0, limit_in_1, decimals);
        let (limit_0, limit_1) = self
            .amm
            .get_amounts(observation.price_tick, limit_ticks, limit_liquidity, decimals);

        remaining_0 -= limit_0;
        remaining_1 -= limit_1;

        debug!(
            lower = limit_lower,
            upper = limit_upper,
            lower_tick = limit_ticks.lower,
            upper_tick = limit_ticks.upper,
            token_0 = limit_0,
            token_1 = limit_1,
            liquidity = limit_liquidity,
            "Limit range sized"
        );

        check_conservation(TokenIndex::Token0, deposited_0, remaining_0)?;
        check_conservation(TokenIndex::Token1, deposited_1, remaining_1)?;

        observation.token_0_left_over = remaining_0.max(0.0);
        observation.token_1_left_over = remaining_1.max(0.0);
        observation.liquidity_in_0 = 0.0;
        observation.liquidity_in_1 = 0.0;

        let placed = PlacedRange {
            price,
            target_price,
            time,
            forecast,
        };
        let ranges = RangePair::new(
            placed.build(base_ticks, base_lower, base_upper, base_0, base_1, base_liquidity),
            placed.build(limit_ticks, limit_lower, limit_upper, limit_0, limit_1, limit_liquidity),
        );

        info!(
            %time,
            price,
            target_price,
            return_forecast = r,
            sd_forecast = sd,
            base_lower,
            base_upper,
            reset_lower = strategy_info.reset_range_lower,
            reset_upper = strategy_info.reset_range_upper,
            left_over_0 = observation.token_0_left_over,
            left_over_1 = observation.token_1_left_over,
            "Liquidity ranges placed"
        );

        Ok(Allocation { ranges, strategy_info })
    }

    /// Bands wider than 1 + r would put a bound at or below zero
    fn check_bands(&self, forecast: ForecastResult, price: f64, time: DateTime<Utc>) -> Result<(), StrategyError> {
        let ForecastResult {
            return_forecast,
            sd_forecast,
        } = forecast;
        let ceiling = 1.0 + return_forecast;

        let alpha_band = self.params.alpha * sd_forecast;
        if alpha_band > ceiling {
            return Err(StrategyError::AlphaParameter {
                alpha: self.params.alpha,
                sd_forecast,
                band: alpha_band,
                return_forecast,
                price,
                time,
            });
        }

        let tau_band = self.params.tau * sd_forecast;
        if tau_band > ceiling {
            return Err(StrategyError::TauParameter {
                tau: self.params.tau,
                sd_forecast,
                band: tau_band,
                return_forecast,
                price,
                time,
            });
        }

        Ok(())
    }
}

/// Relative slack allowed when the AMM consumes slightly more than was deposited
const CONSERVATION_TOLERANCE: f64 = 1e-9;

/// Remaining tokens must lie in `[0, deposited]` up to float slack
fn check_conservation(token: TokenIndex, deposited: f64, remaining: f64) -> Result<(), StrategyError> {
    let slack = CONSERVATION_TOLERANCE * deposited.abs().max(1.0);
    if remaining > deposited || remaining < -slack {
        return Err(StrategyError::ConservationViolated {
            token,
            deposited,
            remaining,
        });
    }
    Ok(())
}

/// Fields shared by both ranges of one placement
struct PlacedRange {
    price: f64,
    target_price: f64,
    time: DateTime<Utc>,
    forecast: ForecastResult,
}

impl PlacedRange {
    fn build(
        &self,
        ticks: TickRange,
        lower_price: f64,
        upper_price: f64,
        token_0_amount: f64,
        token_1_amount: f64,
        position_liquidity: u128,
    ) -> LiquidityRange {
        LiquidityRange {
            price: self.price,
            target_price: self.target_price,
            lower_tick: ticks.lower,
            upper_tick: ticks.upper,
            lower_price,
            upper_price,
            timestamp: self.time,
            token_0_amount,
            token_1_amount,
            position_liquidity,
            volatility: self.forecast.sd_forecast,
            reset_time: self.time,
            return_forecast: self.forecast.return_forecast,
        }
    }
}

//! Tick Grid
//!
//! Conversion between prices and the pool's log-spaced tick grid:
//! price = 1.0001^tick / decimal_adjustment
//!
//! Bounds are snapped to the nearest multiple of the pool's tick spacing.
//! Snapping can collapse a narrow range to a single tick, so every snapped
//! range goes through a repair policy that guarantees `lower < upper`.

use serde::{Deserialize, Serialize};

use super::error::StrategyError;

/// Base of the tick grid
pub const TICK_BASE: f64 = 1.0001;

/// A tick-aligned liquidity range, `lower < upper` once repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    /// Number of ticks covered
    pub fn width(&self) -> i32 {
        self.upper - self.lower
    }

    pub fn contains(&self, tick: i32) -> bool {
        tick >= self.lower && tick < self.upper
    }
}

/// How a snapped range with `lower >= upper` is repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRepair {
    /// Equal ticks widen upward by one spacing; inverted ticks are fatal
    WidenOrReject,
    /// Equal or inverted ticks become `[lower, lower + spacing]`
    ExtendUpper,
    /// Equal or inverted ticks become `[upper - spacing, upper]`
    ExtendLower,
}

/// Raw (unsnapped) tick for a price: floor(log_1.0001(decimal_adjustment * price))
pub fn raw_tick(price: f64, decimal_adjustment: f64) -> Result<i32, StrategyError> {
    let adjusted = decimal_adjustment * price;
    if !adjusted.is_finite() || adjusted <= 0.0 {
        return Err(StrategyError::InvalidPrice { price });
    }
    Ok((adjusted.ln() / TICK_BASE.ln()).floor() as i32)
}

/// Tick for a price snapped to the nearest multiple of `tick_spacing`.
/// Halfway cases round to the even multiple.
pub fn price_to_tick(price: f64, decimal_adjustment: f64, tick_spacing: i32) -> Result<i32, StrategyError> {
    if tick_spacing <= 0 {
        return Err(StrategyError::InvalidTickSpacing(tick_spacing));
    }
    let raw = raw_tick(price, decimal_adjustment)?;
    let snapped = (raw as f64 / tick_spacing as f64).round_ties_even() as i32 * tick_spacing;
    Ok(snapped)
}

/// Human price at a tick
pub fn tick_to_price(tick: i32, decimal_adjustment: f64) -> f64 {
    TICK_BASE.powi(tick) / decimal_adjustment
}

/// Snap both bounds of a price range to the tick grid and repair degenerate results
pub fn snap_range(
    lower_price: f64,
    upper_price: f64,
    decimal_adjustment: f64,
    tick_spacing: i32,
    repair: RangeRepair,
) -> Result<TickRange, StrategyError> {
    let lower = price_to_tick(lower_price, decimal_adjustment, tick_spacing)?;
    let upper = price_to_tick(upper_price, decimal_adjustment, tick_spacing)?;

    if lower < upper {
        return Ok(TickRange::new(lower, upper));
    }

    let repaired = match repair {
        RangeRepair::WidenOrReject if lower == upper => TickRange::new(lower, lower + tick_spacing),
        RangeRepair::WidenOrReject => {
            return Err(StrategyError::BoundsInverted {
                lower_tick: lower,
                upper_tick: upper,
                lower_price,
                upper_price,
            });
        }
        RangeRepair::ExtendUpper => TickRange::new(lower, lower + tick_spacing),
        RangeRepair::ExtendLower => TickRange::new(upper - tick_spacing, upper),
    };

    tracing::warn!(
        lower_tick = lower,
        upper_tick = upper,
        repaired_lower = repaired.lower,
        repaired_upper = repaired.upper,
        "Degenerate tick range widened to one spacing"
    );

    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_raw_tick_of_one_is_zero() {
        assert_eq!(raw_tick(1.0, 1.0).unwrap(), 0);
    }

    #[test]
    fn test_raw_tick_floors() {
        // 1.0001^10 ≈ 1.0010004; slightly below should floor to 9
        assert_eq!(raw_tick(1.001, 1.0).unwrap(), 9);
        // Below one the log is negative and floors away from zero
        assert_eq!(raw_tick(0.99995, 1.0).unwrap(), -1);
    }

    #[test]
    fn test_raw_tick_rejects_non_positive() {
        assert!(matches!(raw_tick(0.0, 1.0), Err(StrategyError::InvalidPrice { .. })));
        assert!(matches!(raw_tick(-5.0, 1.0), Err(StrategyError::InvalidPrice { .. })));
        assert!(matches!(raw_tick(f64::NAN, 1.0), Err(StrategyError::InvalidPrice { .. })));
    }

    #[test]
    fn test_price_to_tick_snaps_to_spacing() {
        for price in [0.5, 1.0, 1500.0, 30_000.0] {
            let tick = price_to_tick(price, 1.0, 60).unwrap();
            assert_eq!(tick % 60, 0);
            let raw = raw_tick(price, 1.0).unwrap();
            assert!((tick - raw).abs() <= 30);
        }
    }

    #[test]
    fn test_price_to_tick_uses_decimal_adjustment() {
        // USDC/WETH style adjustment of 10^12 moves the tick by ~276324
        let plain = raw_tick(1.0, 1.0).unwrap();
        let adjusted = raw_tick(1.0, 1e12).unwrap();
        assert_eq!(plain, 0);
        assert_eq!(adjusted, 276_324);
    }

    #[test]
    fn test_round_half_even() {
        // raw 15 with spacing 10: 1.5 -> 2 -> 20 ; raw 25: 2.5 -> 2 -> 20
        let p15 = tick_to_price(15, 1.0) * 1.000_000_01;
        let p25 = tick_to_price(25, 1.0) * 1.000_000_01;
        assert_eq!(raw_tick(p15, 1.0).unwrap(), 15);
        assert_eq!(raw_tick(p25, 1.0).unwrap(), 25);
        assert_eq!(price_to_tick(p15, 1.0, 10).unwrap(), 20);
        assert_eq!(price_to_tick(p25, 1.0, 10).unwrap(), 20);
    }

    #[test]
    fn test_invalid_spacing() {
        assert!(matches!(
            price_to_tick(1.0, 1.0, 0),
            Err(StrategyError::InvalidTickSpacing(0))
        ));
    }

    #[test]
    fn test_tick_to_price_round_trip() {
        assert_relative_eq!(tick_to_price(0, 1.0), 1.0);
        assert_relative_eq!(tick_to_price(276_324, 1e12), 1.0, max_relative = 1e-4);
    }

    #[test]
    fn test_snap_range_collapsed_widens_upward() {
        // Stablecoin-like band far narrower than one spacing
        let range = snap_range(0.99999, 1.00001, 1.0, 10, RangeRepair::WidenOrReject).unwrap();
        assert_eq!(range, TickRange::new(0, 10));
        assert!(range.lower < range.upper);
    }

    #[test]
    fn test_snap_range_inverted_is_fatal_for_base() {
        let result = snap_range(1.2, 1.0, 1.0, 10, RangeRepair::WidenOrReject);
        assert!(matches!(result, Err(StrategyError::BoundsInverted { .. })));
    }

    #[test]
    fn test_snap_range_inverted_repairs_for_limit() {
        let up = snap_range(1.2, 1.0, 1.0, 10, RangeRepair::ExtendUpper).unwrap();
        assert_eq!(up.width(), 10);
        assert_eq!(up.lower, price_to_tick(1.2, 1.0, 10).unwrap());

        let down = snap_range(1.2, 1.0, 1.0, 10, RangeRepair::ExtendLower).unwrap();
        assert_eq!(down.width(), 10);
        assert_eq!(down.upper, price_to_tick(1.0, 1.0, 10).unwrap());
    }

    #[test]
    fn test_tick_range_contains() {
        let range = TickRange::new(-60, 60);
        assert!(range.contains(0));
        assert!(range.contains(-60));
        assert!(!range.contains(60));
        assert_eq!(range.width(), 120);
    }
}

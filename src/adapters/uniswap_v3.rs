//! Uniswap v3 liquidity math
//!
//! Floating-point version of the concentrated liquidity formulas on raw
//! token units. With sqrt prices sa < sb and current sp:
//!
//! - below range: L = x * sa * sb / (sb - sa)
//! - in range:    L = min(x * sp * sb / (sb - sp), y / (sp - sa))
//! - above range: L = y / (sb - sa)
//!
//! Liquidity is floored to an integer, so the amounts it holds never
//! exceed the amounts supplied.

use crate::domain::{TickRange, TokenDecimals, TICK_BASE};
use crate::ports::AmmMath;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniswapV3Math;

impl UniswapV3Math {
    pub fn new() -> Self {
        Self
    }
}

/// sqrt(1.0001^tick) in raw units
pub fn sqrt_price_at_tick(tick: i32) -> f64 {
    TICK_BASE.powf(tick as f64 / 2.0)
}

fn unit(decimals: u8) -> f64 {
    10f64.powi(decimals as i32)
}

fn liquidity_for_amount_0(amount: f64, sqrt_a: f64, sqrt_b: f64) -> f64 {
    amount * sqrt_a * sqrt_b / (sqrt_b - sqrt_a)
}

fn liquidity_for_amount_1(amount: f64, sqrt_a: f64, sqrt_b: f64) -> f64 {
    amount / (sqrt_b - sqrt_a)
}

impl AmmMath for UniswapV3Math {
    fn get_liquidity(
        &self,
        current_tick: i32,
        range: TickRange,
        amount_0: f64,
        amount_1: f64,
        decimals: TokenDecimals,
    ) -> u128 {
        let (lower, upper) = (range.lower.min(range.upper), range.lower.max(range.upper));
        if lower == upper {
            return 0;
        }
        let sqrt_a = sqrt_price_at_tick(lower);
        let sqrt_b = sqrt_price_at_tick(upper);
        let raw_0 = amount_0 * unit(decimals.decimals_0);
        let raw_1 = amount_1 * unit(decimals.decimals_1);

        let liquidity = if current_tick <= lower {
            liquidity_for_amount_0(raw_0, sqrt_a, sqrt_b)
        } else if current_tick < upper {
            let sqrt_p = sqrt_price_at_tick(current_tick);
            liquidity_for_amount_0(raw_0, sqrt_p, sqrt_b).min(liquidity_for_amount_1(raw_1, sqrt_a, sqrt_p))
        } else {
            liquidity_for_amount_1(raw_1, sqrt_a, sqrt_b)
        };

        // Saturating cast: negative and NaN become zero
        liquidity.floor() as u128
    }

    fn get_amounts(
        &self,
        current_tick: i32,
        range: TickRange,
        liquidity: u128,
        decimals: TokenDecimals,
    ) -> (f64, f64) {
        let (lower, upper) = (range.lower.min(range.upper), range.lower.max(range.upper));
        let sqrt_a = sqrt_price_at_tick(lower);
        let sqrt_b = sqrt_price_at_tick(upper);
        let liquidity = liquidity as f64;

        let (raw_0, raw_1) = if current_tick <= lower {
            (liquidity * (sqrt_b - sqrt_a) / (sqrt_a * sqrt_b), 0.0)
        } else if current_tick < upper {
            let sqrt_p = sqrt_price_at_tick(current_tick);
            (
                liquidity * (sqrt_b - sqrt_p) / (sqrt_p * sqrt_b),
                liquidity * (sqrt_p - sqrt_a),
            )
        } else {
            (0.0, liquidity * (sqrt_b - sqrt_a))
        };

        (raw_0 / unit(decimals.decimals_0), raw_1 / unit(decimals.decimals_1))
    }
}

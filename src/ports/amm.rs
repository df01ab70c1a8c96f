//! AMM math port
//!
//! Converts token amounts into position liquidity for a tick range and
//! back. Amounts are human units (already divided by token decimals).

use crate::domain::{TickRange, TokenDecimals};

#[cfg_attr(test, mockall::automock)]
pub trait AmmMath {
    /// Largest liquidity that `amount_0` / `amount_1` can fund in `range` at `current_tick`
    fn get_liquidity(
        &self,
        current_tick: i32,
        range: TickRange,
        amount_0: f64,
        amount_1: f64,
        decimals: TokenDecimals,
    ) -> u128;

    /// Token amounts held by `liquidity` in `range` at `current_tick`
    fn get_amounts(
        &self,
        current_tick: i32,
        range: TickRange,
        liquidity: u128,
        decimals: TokenDecimals,
    ) -> (f64, f64);
}

//! Execution port
//!
//! The harness owns the pool simulation. Before new ranges are placed the
//! strategy asks it to pull the existing liquidity, realize fees and return
//! the withdrawn tokens to `liquidity_in_0` / `liquidity_in_1`.

use crate::domain::StrategyObservation;

#[cfg_attr(test, mockall::automock)]
pub trait LiquidityManager {
    fn remove_liquidity(&mut self, observation: &mut StrategyObservation);
}

//! Strategy Layer - Autoregressive range placement
//!
//! Decision logic for a concentrated liquidity position pair:
//! - Two-pass z-score cleaning of the model data
//! - AR(1)-GARCH(1,1) forecast anchored on the current timepoint
//! - Reset trigger with fixed priority (exit > volatility decay > idle tokens)
//! - Base and single-sided limit range allocation on the tick grid
//! - Flat metrics record per step
//!
//! `AutoRegressiveStrategy` wires these together for the harness.

pub mod allocator;
pub mod autoregressive;
pub mod data_cleaner;
pub mod forecaster;
pub mod metrics;
pub mod params;
pub mod rebalance;

pub use allocator::{Allocation, RangeAllocator};
pub use autoregressive::{AutoRegressiveStrategy, RebalanceOutcome};
pub use data_cleaner::{clean_for_garch, z_scores};
pub use forecaster::{resample_returns, Forecaster};
pub use metrics::{strategy_metrics, StrategyMetrics};
pub use params::{ParameterError, StrategyParameters};
pub use rebalance::{volatility_check_due, ResetConditions, TriggerEvaluation, RESET_PRIORITY};

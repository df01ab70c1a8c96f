//! Butters AR Range - Autoregressive concentrated liquidity range strategy
//!
//! Decides when a Uniswap v3 style position pair should be withdrawn and
//! re-placed, and where, from an AR(1)-GARCH(1,1) forecast of the pool price.
//!
//! # Modules
//!
//! - `domain`: Core types (observations, ranges, ticks, forecasts, errors)
//! - `ports`: Trait abstractions (GapFiller, ReturnModelEstimator, AmmMath, LiquidityManager)
//! - `strategy`: Data cleaning, forecasting, reset trigger, range allocation, metrics
//! - `adapters`: Reference implementations (forward fill, GARCH MLE, Uniswap v3 math)
//! - `config`: Configuration loading and validation

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod strategy;

pub use domain::{ForecastResult, RangePair, ResetReason, StrategyError, StrategyObservation};
pub use strategy::{AutoRegressiveStrategy, StrategyParameters};

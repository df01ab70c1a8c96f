//! Domain Layer - Core types for the range strategy
//!
//! Pure data and invariants with no knowledge of how forecasts are fitted
//! or how liquidity amounts are computed. External interactions go through
//! the ports layer.
//!
//! - `price`: raw and cleaned price samples
//! - `forecast`: forecast result and sampling frequency
//! - `tick`: tick grid snapping and degenerate-range repair
//! - `range`: placed liquidity ranges and the reset band
//! - `observation`: per-step state lent by the harness
//! - `error`: strategy failure taxonomy

pub mod error;
pub mod forecast;
pub mod observation;
pub mod price;
pub mod range;
pub mod tick;

pub use error::{StrategyError, TokenIndex};
pub use forecast::{DataFrequency, ForecastResult};
pub use observation::{FeeState, PoolGeometry, ResetReason, StrategyObservation, TokenDecimals};
pub use price::{CleanedObservation, PriceObservation};
pub use range::{LiquidityRange, RangePair, StrategyInfo};
pub use tick::{price_to_tick, raw_tick, snap_range, tick_to_price, RangeRepair, TickRange, TICK_BASE};

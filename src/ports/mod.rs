//! Ports Layer - Trait definitions for external collaborators
//!
//! The strategy core depends only on these interfaces:
//! - Market data preparation (gap filling)
//! - Return model estimation (AR-GARCH fit)
//! - AMM liquidity math
//! - Liquidity removal performed by the harness

pub mod amm;
pub mod estimator;
pub mod execution;
pub mod market_data;

pub use amm::AmmMath;
pub use estimator::{
    ArGarchParams, EstimationError, FittedModel, ModelForecast, ModelSpec, ReturnModelEstimator,
};
pub use execution::LiquidityManager;
pub use market_data::GapFiller;

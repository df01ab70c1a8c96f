//! Adapters Layer - Reference implementations of the port traits
//!
//! - Forward fill: regular-grid gap filling of raw price series
//! - GARCH: Gaussian quasi-MLE of the AR(1)-GARCH(1,1) return model
//! - Uniswap v3: concentrated liquidity amount/liquidity conversion

pub mod forward_fill;
pub mod garch;
pub mod uniswap_v3;

pub use forward_fill::ForwardFill;
pub use garch::{GarchConfig, GarchMle};
pub use uniswap_v3::{sqrt_price_at_tick, UniswapV3Math};

//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, EstimatorSection, GapFillSection, ModelSection, StrategySection, load_config,
};

//! Configuration Loader
//!
//! Loads and validates strategy configuration from TOML files.
//!
//! ```toml
//! [strategy]
//! alpha = 2.0
//! tau = 2.0
//! volatility_reset_ratio = 0.8
//! tokens_outside_reset = 0.05
//! data_frequency = "D"
//!
//! [model]            # optional
//! forecast_window_days = 90
//!
//! [estimator]        # optional
//! max_iterations = 10000
//!
//! [gap_fill]         # optional
//! step_minutes = 1
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::adapters::forward_fill::{ForwardFill, DEFAULT_STEP_MINUTES};
use crate::adapters::garch::{GarchConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_MIN_OBSERVATIONS, DEFAULT_TOLERANCE};
use crate::domain::DataFrequency;
use crate::strategy::params::{
    StrategyParameters, DEFAULT_FORECAST_WINDOW_DAYS, DEFAULT_RETURN_CLAMP, DEFAULT_TOKENS_OUTSIDE_RESET,
    DEFAULT_VOLATILITY_CHECK_MINUTES, DEFAULT_Z_SCORE_CUTOFF,
};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub strategy: StrategySection,
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub estimator: EstimatorSection,
    #[serde(default)]
    pub gap_fill: GapFillSection,
}

/// Strategy configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct StrategySection {
    /// Base range half-width in forecast standard deviations
    pub alpha: f64,
    /// Reset band half-width in forecast standard deviations
    pub tau: f64,
    /// Reset when forecast sd / placed sd falls to this ratio
    pub volatility_reset_ratio: f64,
    /// Idle value fraction that forces a reset
    #[serde(default = "default_tokens_outside_reset")]
    pub tokens_outside_reset: f64,
    /// "D", "H" or "M"
    #[serde(default)]
    pub data_frequency: DataFrequency,
}

/// Forecast model section (optional)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub forecast_window_days: i64,
    pub return_clamp: f64,
    pub z_score_cutoff: f64,
    pub volatility_check_minutes: i64,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            forecast_window_days: DEFAULT_FORECAST_WINDOW_DAYS,
            return_clamp: DEFAULT_RETURN_CLAMP,
            z_score_cutoff: DEFAULT_Z_SCORE_CUTOFF,
            volatility_check_minutes: DEFAULT_VOLATILITY_CHECK_MINUTES,
        }
    }
}

/// Estimator section (optional)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EstimatorSection {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub min_observations: usize,
}

impl Default for EstimatorSection {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
        }
    }
}

/// Gap filling section (optional)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GapFillSection {
    /// Grid step of the filled series
    pub step_minutes: i64,
}

impl Default for GapFillSection {
    fn default() -> Self {
        Self {
            step_minutes: DEFAULT_STEP_MINUTES,
        }
    }
}

fn default_tokens_outside_reset() -> f64 {
    DEFAULT_TOKENS_OUTSIDE_RESET
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Strategy and model sections
        StrategyParameters::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        // Estimator section
        if self.estimator.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be > 0".to_string(),
            ));
        }

        if !(self.estimator.tolerance > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "tolerance must be > 0, got {}",
                self.estimator.tolerance
            )));
        }

        if self.estimator.min_observations < 3 {
            return Err(ConfigError::ValidationError(format!(
                "min_observations must be >= 3, got {}",
                self.estimator.min_observations
            )));
        }

        // Gap fill section
        ForwardFill::try_from(self)?;

        Ok(())
    }
}

impl From<&Config> for StrategyParameters {
    fn from(config: &Config) -> Self {
        StrategyParameters {
            alpha: config.strategy.alpha,
            tau: config.strategy.tau,
            volatility_reset_ratio: config.strategy.volatility_reset_ratio,
            tokens_outside_reset: config.strategy.tokens_outside_reset,
            data_frequency: config.strategy.data_frequency,
            forecast_window_days: config.model.forecast_window_days,
            return_clamp: config.model.return_clamp,
            z_score_cutoff: config.model.z_score_cutoff,
            volatility_check_minutes: config.model.volatility_check_minutes,
        }
    }
}

impl From<&Config> for GarchConfig {
    fn from(config: &Config) -> Self {
        GarchConfig {
            max_iterations: config.estimator.max_iterations,
            tolerance: config.estimator.tolerance,
            min_observations: config.estimator.min_observations,
        }
    }
}

impl TryFrom<&Config> for ForwardFill {
    type Error = ConfigError;

    fn try_from(config: &Config) -> Result<Self, Self::Error> {
        let minutes = config.gap_fill.step_minutes;
        chrono::Duration::try_minutes(minutes)
            .filter(|_| minutes > 0)
            .map(ForwardFill::new)
            .ok_or_else(|| {
                ConfigError::ValidationError(format!("step_minutes must be > 0 and representable, got {minutes}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[strategy]
alpha = 2.0
tau = 1.5
volatility_reset_ratio = 0.8
tokens_outside_reset = 0.05
data_frequency = "H"

[model]
forecast_window_days = 60
return_clamp = 0.2
z_score_cutoff = 3.0
volatility_check_minutes = 60

[estimator]
max_iterations = 5000
tolerance = 1e-8
min_observations = 30

[gap_fill]
step_minutes = 5
"#
        .to_string()
    }

    fn write(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.strategy.alpha, 2.0);
        assert_eq!(config.strategy.data_frequency, DataFrequency::Hourly);
        assert_eq!(config.model.forecast_window_days, 60);
        assert_eq!(config.estimator.min_observations, 30);
        assert_eq!(config.gap_fill.step_minutes, 5);
    }

    #[test]
    fn test_optional_sections_default() {
        let file = write(
            r#"
[strategy]
alpha = 3.0
tau = 3.5
volatility_reset_ratio = 0.5
"#,
        );
        let config = load_config(file.path()).unwrap();
        let params = StrategyParameters::from(&config);

        assert_eq!(params.tokens_outside_reset, 0.05);
        assert_eq!(params.data_frequency, DataFrequency::Daily);
        assert_eq!(params.forecast_window_days, 90);
        assert_eq!(params.return_clamp, 0.25);
        assert_eq!(GarchConfig::from(&config), GarchConfig::default());
        assert_eq!(ForwardFill::try_from(&config).unwrap(), ForwardFill::default());
    }

    #[test]
    fn test_conversions() {
        let file = write(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        let params = StrategyParameters::from(&config);
        assert_eq!(params.alpha, 2.0);
        assert_eq!(params.tau, 1.5);
        assert_eq!(params.return_clamp, 0.2);

        let garch = GarchConfig::from(&config);
        assert_eq!(garch.max_iterations, 5000);
        assert_eq!(garch.tolerance, 1e-8);

        let filler = ForwardFill::try_from(&config).unwrap();
        assert_eq!(filler.step(), chrono::Duration::minutes(5));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_parse_error() {
        let file = write("[strategy]\nalpha = \"wide\"\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_alpha() {
        let file = write(&create_valid_config().replace("alpha = 2.0", "alpha = 0.0"));
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn test_invalid_frequency() {
        let file = write(&create_valid_config().replace("data_frequency = \"H\"", "data_frequency = \"W\""));
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_estimator_and_gap_fill() {
        let file = write(&create_valid_config().replace("max_iterations = 5000", "max_iterations = 0"));
        assert!(matches!(load_config(file.path()), Err(ConfigError::ValidationError(_))));

        let file = write(&create_valid_config().replace("step_minutes = 5", "step_minutes = 0"));
        assert!(matches!(load_config(file.path()), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_out_of_range_durations_rejected() {
        let file = write(&create_valid_config().replace("step_minutes = 5", "step_minutes = 9000000000000000000"));
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("step_minutes"));

        let file = write(&create_valid_config().replace(
            "forecast_window_days = 60",
            "forecast_window_days = 1000000000000000000",
        ));
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("forecast window"));
    }
}

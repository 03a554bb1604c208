use crate::error::{ForecastError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOW_REVENUE_FLOOR: f64 = 50.0;
pub const DEFAULT_VOLATILITY_THRESHOLD: f64 = 10.0;
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.80;
pub const DEFAULT_BACKFIT_ITERATIONS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema, Default)]
#[serde(rename_all = "PascalCase")]
pub enum SeasonalityMode {
    #[default]
    #[schemars(
        description = "Fit yearly seasonality only when the history spans at least 24 months."
    )]
    Auto,

    #[schemars(description = "Always fit monthly seasonal offsets, even on short histories.")]
    Enabled,

    #[schemars(description = "Trend only.")]
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ModelSettings {
    #[serde(default)]
    #[schemars(description = "Whether the additive model fits a yearly seasonal component")]
    pub seasonality: SeasonalityMode,

    #[serde(default = "default_interval_width")]
    #[schemars(
        description = "Coverage of the prediction interval around each estimate, strictly between 0 and 1. Defaults to 0.80."
    )]
    pub interval_width: f64,

    #[serde(default = "default_backfit_iterations")]
    #[schemars(description = "Trend/seasonality refinement passes. Must be at least 1.")]
    pub backfit_iterations: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            seasonality: SeasonalityMode::Auto,
            interval_width: DEFAULT_INTERVAL_WIDTH,
            backfit_iterations: DEFAULT_BACKFIT_ITERATIONS,
        }
    }
}

impl ModelSettings {
    pub fn validate(&self) -> Result<()> {
        let width = self.interval_width;
        if !(width > 0.0 && width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be strictly between 0 and 1 (got {})",
                width
            )));
        }

        if self.backfit_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "backfit_iterations must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_interval_width() -> f64 {
    DEFAULT_INTERVAL_WIDTH
}

fn default_backfit_iterations() -> usize {
    DEFAULT_BACKFIT_ITERATIONS
}

fn default_low_revenue_floor() -> f64 {
    DEFAULT_LOW_REVENUE_FLOOR
}

fn default_volatility_threshold() -> f64 {
    DEFAULT_VOLATILITY_THRESHOLD
}

/// Immutable parameters for one forecast run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ForecastConfig {
    #[schemars(description = "Product identifier (stock code) to forecast")]
    pub product_id: String,

    #[schemars(description = "Market (country) to forecast")]
    pub market: String,

    #[schemars(description = "Number of future months to forecast and report. At least 1.")]
    pub forecast_horizon: usize,

    #[serde(default = "default_low_revenue_floor")]
    #[schemars(
        description = "Absolute revenue below which a forecast month is flagged as low revenue. Defaults to 50."
    )]
    pub low_revenue_floor: f64,

    #[serde(default = "default_volatility_threshold")]
    #[schemars(
        description = "Percentage deviation from the baseline above which a month is flagged as volatile. Defaults to 10."
    )]
    pub volatility_threshold: f64,

    #[serde(default)]
    pub model: ModelSettings,
}

impl ForecastConfig {
    pub fn new(product_id: impl Into<String>, market: impl Into<String>, horizon: usize) -> Self {
        Self {
            product_id: product_id.into(),
            market: market.into(),
            forecast_horizon: horizon,
            low_revenue_floor: DEFAULT_LOW_REVENUE_FLOOR,
            volatility_threshold: DEFAULT_VOLATILITY_THRESHOLD,
            model: ModelSettings::default(),
        }
    }

    pub fn with_thresholds(mut self, low_revenue_floor: f64, volatility_threshold: f64) -> Self {
        self.low_revenue_floor = low_revenue_floor;
        self.volatility_threshold = volatility_threshold;
        self
    }

    pub fn with_model(mut self, model: ModelSettings) -> Self {
        self.model = model;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.forecast_horizon < 1 {
            return Err(ForecastError::InvalidHorizon(self.forecast_horizon));
        }

        validate_threshold("low_revenue_floor", self.low_revenue_floor)?;
        validate_threshold("volatility_threshold", self.volatility_threshold)?;

        self.model.validate()?;

        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ForecastConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ForecastConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

fn validate_threshold(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ForecastError::InvalidThreshold {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ForecastConfig::new("85123A", "United Kingdom", 3);
        assert_eq!(config.low_revenue_floor, 50.0);
        assert_eq!(config.volatility_threshold, 10.0);
        assert_eq!(config.model.seasonality, SeasonalityMode::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let config = ForecastConfig::new("85123A", "United Kingdom", 0);
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidHorizon(0))
        ));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = ForecastConfig::new("85123A", "France", 2).with_thresholds(-1.0, 10.0);
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidThreshold { .. })
        ));

        let config = ForecastConfig::new("85123A", "France", 2).with_thresholds(50.0, f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_width_bounds() {
        let model = ModelSettings {
            interval_width: 1.0,
            ..ModelSettings::default()
        };
        let config = ForecastConfig::new("22423", "Germany", 1).with_model(model);
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let json = r#"{ "product_id": "22423", "market": "EIRE", "forecast_horizon": 6 }"#;
        let config = ForecastConfig::from_json_str(json).unwrap();
        assert_eq!(config.forecast_horizon, 6);
        assert_eq!(config.low_revenue_floor, DEFAULT_LOW_REVENUE_FLOOR);
        assert_eq!(config.model, ModelSettings::default());
    }

    #[test]
    fn test_from_json_validates() {
        let json = r#"{ "product_id": "22423", "market": "EIRE", "forecast_horizon": 0 }"#;
        assert!(ForecastConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = ForecastConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("product_id"));
        assert!(schema_json.contains("forecast_horizon"));
        assert!(schema_json.contains("volatility_threshold"));
    }
}

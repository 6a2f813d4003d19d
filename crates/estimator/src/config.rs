//! Estimator configuration
//!
//! Defaults reproduce the reference setup (100 trees, seed 42, 80/20 split).
//! Values can come from a TOML file and are then overridden by environment
//! variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::adjuster::PriceAdjuster;
use crate::errors::{EstimatorError, Result};
use crate::forest::ForestConfig;

pub const ENV_DATASET: &str = "HOUSE_PRICE_DATASET";
pub const ENV_SEED: &str = "HOUSE_PRICE_SEED";
pub const ENV_TREES: &str = "HOUSE_PRICE_TREES";
pub const ENV_LOG: &str = "HOUSE_PRICE_LOG";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub dataset: DatasetConfig,
    pub split: SplitConfig,
    pub forest: ForestConfig,
    pub adjustment: PriceAdjuster,
    pub logging: LoggingConfig,
}

/// Dataset location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("india_housing_prices_small.csv"),
        }
    }
}

/// Train/test split parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or `house_price_estimator=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EstimatorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EstimatorError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| EstimatorError::Config(format!("failed to parse config: {e}")))
    }

    /// The TOML file if one is given, defaults otherwise.
    ///
    /// Logs nothing and applies no environment overrides, so it can run
    /// before the tracing subscriber exists.
    pub fn read(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Log directive to start with: `HOUSE_PRICE_LOG`, else `logging.level`.
    pub fn log_level(&self) -> String {
        self.log_level_from(|key| env::var(key).ok())
    }

    fn log_level_from<F: Fn(&str) -> Option<String>>(&self, lookup: F) -> String {
        lookup(ENV_LOG).unwrap_or_else(|| self.logging.level.clone())
    }

    /// Apply `HOUSE_PRICE_*` environment variables on top of current values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(path) = lookup(ENV_DATASET) {
            self.dataset.path = PathBuf::from(path);
        }
        if let Some(seed) = lookup(ENV_SEED) {
            match seed.parse::<u64>() {
                Ok(seed) => {
                    self.split.seed = seed;
                    self.forest.seed = seed;
                }
                Err(_) => warn!("Ignoring invalid {}={}", ENV_SEED, seed),
            }
        }
        if let Some(trees) = lookup(ENV_TREES) {
            match trees.parse::<usize>() {
                Ok(trees) => self.forest.n_estimators = trees,
                Err(_) => warn!("Ignoring invalid {}={}", ENV_TREES, trees),
            }
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.split.test_fraction) {
            return Err(EstimatorError::Config(format!(
                "split.test_fraction must be in [0, 1), got {}",
                self.split.test_fraction
            )));
        }
        self.forest.validate()?;
        self.adjustment.validate()?;
        Ok(())
    }
}

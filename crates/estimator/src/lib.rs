//! House price estimator
//!
//! Trains a random forest on a static housing dataset once per process and
//! serves adjusted price estimates for single-record queries.
//!
//! ```no_run
//! use house_price_estimator::{EstimatorConfig, HousePriceEstimator, Record};
//!
//! # fn main() -> house_price_estimator::Result<()> {
//! let estimator = HousePriceEstimator::new(EstimatorConfig::default())?;
//! let query = Record::new()
//!     .with("BHK", 2.0)
//!     .with("Property_Type", "Villa");
//!     // ... remaining schema fields
//! let prediction = estimator.predict(&query)?;
//! println!("{prediction}");
//! # Ok(())
//! # }
//! ```

pub mod adjuster;
pub mod cart;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod estimator;
pub mod forest;
pub mod pipeline;
pub mod preprocessing;
pub mod record;
pub mod schema;
#[cfg(any(test, feature = "enable-tests"))]
pub mod testing;
pub mod trainer;
pub mod tree;

pub use adjuster::{AdjustmentRule, PriceAdjuster};
pub use config::EstimatorConfig;
pub use dataset::{Dataset, Split};
pub use errors::{EstimatorError, Result, SchemaError};
pub use estimator::HousePriceEstimator;
pub use forest::{ForestConfig, MaxFeatures, RandomForestRegressor};
pub use pipeline::{FittedPipeline, PipelineMetadata, Prediction};
pub use preprocessing::Preprocessor;
pub use record::{FieldValue, Record};
pub use schema::{ColumnRole, FeatureSchema};
pub use trainer::{fit_pipeline, TrainingOrchestrator, TrainingParams};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

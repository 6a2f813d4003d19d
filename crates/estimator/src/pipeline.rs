//! Fitted preprocessing + forest, and the prediction result.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::adjuster::PriceAdjuster;
use crate::errors::Result;
use crate::forest::RandomForestRegressor;
use crate::preprocessing::Preprocessor;
use crate::record::Record;
use crate::schema::FeatureSchema;

/// Facts about how a pipeline was trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub dataset_fingerprint: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub feature_count: usize,
    pub tree_count: usize,
    pub trained_at: i64,
    pub fit_duration_ms: u64,
}

/// Preprocessor and forest fitted together on the training partition.
///
/// Never mutated after construction; shared read-only through `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    pub(crate) preprocessor: Preprocessor,
    pub(crate) forest: RandomForestRegressor,
    pub(crate) metadata: PipelineMetadata,
}

impl FittedPipeline {
    /// Raw forest estimate for one record.
    pub fn predict_raw(&self, record: &Record) -> Result<f64> {
        let features = self.preprocessor.transform(record)?;
        self.forest.predict(&features)
    }

    /// Raw estimate followed by the property-type adjustment.
    ///
    /// Input shape must already have been checked against `schema`.
    pub fn predict(
        &self,
        schema: &FeatureSchema,
        adjuster: &PriceAdjuster,
        record: &Record,
    ) -> Result<Prediction> {
        let raw = self.predict_raw(record)?;
        let property_type = record
            .categorical(schema.adjustment_column)
            .unwrap_or_default()
            .to_string();
        let multiplier = adjuster.multiplier(&property_type);

        Ok(Prediction {
            raw,
            multiplier,
            price: raw * multiplier,
            property_type,
        })
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn forest(&self) -> &RandomForestRegressor {
        &self.forest
    }

    pub fn metadata(&self) -> &PipelineMetadata {
        &self.metadata
    }
}

/// Final price estimate for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Forest output before adjustment
    pub raw: f64,
    pub multiplier: f64,
    /// Adjusted price, in the dataset's target unit
    pub price: f64,
    pub property_type: String,
}

impl Prediction {
    /// Price rounded to two decimals.
    pub fn rounded_price(&self) -> f64 {
        (self.price * 100.0).round() / 100.0
    }

    /// Price formatted with two decimals, as shown to the user.
    pub fn display_price(&self) -> String {
        format!("{:.2}", self.price)
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_price())
    }
}

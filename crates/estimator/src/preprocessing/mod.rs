//! Record → feature vector preprocessing
//!
//! Two explicit transforms applied to disjoint column sets and concatenated:
//! - numerical columns are standardized with training-set mean and scale
//! - categorical columns are one-hot encoded against the training vocabulary
//!
//! Output layout is the numerical block followed by one indicator block per
//! categorical column, both in schema order. Parameters are fitted once on
//! the training partition and frozen afterwards.

mod encoder;
mod scaler;

pub use encoder::{CategoryVocabulary, OneHotEncoder};
pub use scaler::StandardScaler;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::errors::{EstimatorError, Result};
use crate::record::Record;
use crate::schema::FeatureSchema;

/// Fitted column transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    scaler: StandardScaler,
    encoder: OneHotEncoder,
}

impl Preprocessor {
    /// Fit scaler and encoder on training records.
    #[instrument(skip(schema, records), fields(rows = records.len()))]
    pub fn fit(schema: &FeatureSchema, records: &[&Record]) -> Result<Self> {
        let mut numeric_rows = Vec::with_capacity(records.len());
        let mut category_rows = Vec::with_capacity(records.len());

        for record in records {
            schema.check_record(record).map_err(|err| {
                EstimatorError::Training(format!("training record rejected: {err}"))
            })?;
            numeric_rows.push(numeric_values(schema, record)?);
            category_rows.push(categorical_values(schema, record)?);
        }

        let scaler = StandardScaler::fit(schema.numerical, &numeric_rows)?;
        let encoder = OneHotEncoder::fit(schema.categorical, &category_rows);

        info!(
            "Preprocessor fitted: {} numerical + {} one-hot features",
            scaler.width(),
            encoder.width()
        );

        Ok(Self { scaler, encoder })
    }

    /// Transform one record with the frozen parameters.
    pub fn transform(&self, record: &Record) -> Result<Vec<f64>> {
        let numeric = self
            .scaler
            .columns
            .iter()
            .map(|c| {
                record.numeric(c).ok_or_else(|| {
                    EstimatorError::InputShape(format!("missing numeric field `{c}`"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let categories = self
            .encoder
            .vocabularies
            .iter()
            .map(|v| {
                record.categorical(&v.column).ok_or_else(|| {
                    EstimatorError::InputShape(format!("missing categorical field `{}`", v.column))
                })
            })
            .collect::<Result<Vec<&str>>>()?;

        let mut out = Vec::with_capacity(self.output_width());
        self.scaler.transform_into(&numeric, &mut out);
        self.encoder.transform_into(&categories, &mut out);
        Ok(out)
    }

    pub fn transform_batch(&self, records: &[&Record]) -> Result<Vec<Vec<f64>>> {
        records.iter().map(|r| self.transform(r)).collect()
    }

    pub fn output_width(&self) -> usize {
        self.scaler.width() + self.encoder.width()
    }

    /// Output column names, `num__<col>` then `cat__<col>_<category>`.
    pub fn feature_names(&self) -> Vec<String> {
        self.scaler
            .columns
            .iter()
            .map(|c| format!("num__{c}"))
            .chain(self.encoder.feature_names())
            .collect()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }
}

fn numeric_values(schema: &FeatureSchema, record: &Record) -> Result<Vec<f64>> {
    schema
        .numerical
        .iter()
        .map(|&c| {
            record
                .numeric(c)
                .ok_or_else(|| EstimatorError::InputShape(format!("missing numeric field `{c}`")))
        })
        .collect()
}

fn categorical_values<'r>(schema: &FeatureSchema, record: &'r Record) -> Result<Vec<&'r str>> {
    schema
        .categorical
        .iter()
        .map(|&c| {
            record.categorical(c).ok_or_else(|| {
                EstimatorError::InputShape(format!("missing categorical field `{c}`"))
            })
        })
        .collect()
}

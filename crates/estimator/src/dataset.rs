//! CSV dataset loading and train/test splitting
//!
//! Reads a headered CSV, checks it against the [`FeatureSchema`], drops the
//! excluded columns and keeps typed records plus numeric targets. The loaded
//! dataset is immutable.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{EstimatorError, Result, SchemaError};
use crate::record::{FieldValue, Record};
use crate::schema::{ColumnRole, FeatureSchema};

/// Parsed dataset with one record and one target per row.
#[derive(Clone, Debug)]
pub struct Dataset {
    schema: &'static FeatureSchema,
    header: Vec<String>,
    records: Vec<Record>,
    targets: Vec<f64>,
    fingerprint: String,
}

impl Dataset {
    /// Load dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, schema: &'static FeatureSchema) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading dataset from {}", path.display());
        let file = std::fs::File::open(path).map_err(|err| {
            EstimatorError::Dataset(format!("failed to open {}: {err}", path.display()))
        })?;
        Self::from_reader(file, schema)
    }

    /// Load dataset from any CSV source
    pub fn from_reader<R: Read>(reader: R, schema: &'static FeatureSchema) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        schema.validate_header(&header)?;

        let mut records = Vec::new();
        let mut targets = Vec::new();

        for (row_idx, row) in rdr.records().enumerate() {
            let row = row?;
            // Header is line 1
            let line = row_idx + 2;
            let mut record = Record::new();
            let mut target = None;

            for (column, raw) in header.iter().zip(row.iter()) {
                match schema.role_of(column) {
                    Some(ColumnRole::Target) => {
                        let value = parse_number(raw).ok_or_else(|| SchemaError::NonNumericTarget {
                            row: line,
                            value: raw.to_string(),
                        })?;
                        target = Some(value);
                    }
                    Some(ColumnRole::Numerical) => {
                        let value =
                            parse_number(raw).ok_or_else(|| SchemaError::NonNumericFeature {
                                column: column.clone(),
                                row: line,
                                value: raw.to_string(),
                            })?;
                        record.insert(column.as_str(), value);
                    }
                    Some(ColumnRole::Categorical) => {
                        record.insert(column.as_str(), raw);
                    }
                    Some(ColumnRole::Excluded) | None => {}
                }
            }

            let target = target.ok_or_else(|| {
                EstimatorError::Dataset(format!("line {line}: row has no target value"))
            })?;
            if record.len() != schema.input_column_count() {
                return Err(EstimatorError::Dataset(format!(
                    "line {line}: expected {} fields, got {}",
                    schema.input_column_count(),
                    record.len()
                )));
            }

            records.push(record);
            targets.push(target);
        }

        Self::from_records(schema, header, records, targets)
    }

    /// Build a dataset from already parsed records.
    pub fn from_records(
        schema: &'static FeatureSchema,
        header: Vec<String>,
        records: Vec<Record>,
        targets: Vec<f64>,
    ) -> Result<Self> {
        schema.validate()?;
        if records.is_empty() {
            return Err(EstimatorError::Dataset("dataset is empty".into()));
        }
        if records.len() != targets.len() {
            return Err(EstimatorError::Dataset(format!(
                "{} records but {} targets",
                records.len(),
                targets.len()
            )));
        }
        for record in &records {
            schema.check_record(record)?;
        }

        let fingerprint = fingerprint(schema, &records, &targets);
        info!(
            "Loaded {} rows, dataset fingerprint {}",
            records.len(),
            &fingerprint[..16]
        );

        Ok(Self {
            schema,
            header,
            records,
            targets,
            fingerprint,
        })
    }

    pub fn schema(&self) -> &'static FeatureSchema {
        self.schema
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// BLAKE3 hex digest of the parsed rows.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Get number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct values of a categorical column.
    pub fn categories(&self, column: &str) -> Vec<String> {
        let values: BTreeSet<&str> = self
            .records
            .iter()
            .filter_map(|r| r.categorical(column))
            .collect();
        values.into_iter().map(str::to_string).collect()
    }

    /// Deterministic shuffled split into train and test partitions.
    ///
    /// `n_test = ceil(test_fraction * n)`, reduced if needed so that at least
    /// one training row remains.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<Split<'_>> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(EstimatorError::Config(format!(
                "test fraction must be in [0, 1), got {test_fraction}"
            )));
        }

        let n = self.len();
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let n_test = ((test_fraction * n as f64).ceil() as usize).min(n.saturating_sub(1));
        let train_indices = indices.split_off(n_test);
        let test_indices = indices;

        debug!(
            "Split {} rows into {} train / {} test (seed {})",
            n,
            train_indices.len(),
            test_indices.len(),
            seed
        );

        Ok(Split {
            dataset: self,
            train_indices,
            test_indices,
        })
    }
}

/// Index view of a train/test split over a [`Dataset`].
#[derive(Debug, Clone)]
pub struct Split<'a> {
    dataset: &'a Dataset,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl<'a> Split<'a> {
    pub fn train_records(&self) -> Vec<&'a Record> {
        self.train_indices
            .iter()
            .map(|&i| &self.dataset.records[i])
            .collect()
    }

    pub fn train_targets(&self) -> Vec<f64> {
        self.train_indices
            .iter()
            .map(|&i| self.dataset.targets[i])
            .collect()
    }

    pub fn test_records(&self) -> Vec<&'a Record> {
        self.test_indices
            .iter()
            .map(|&i| &self.dataset.records[i])
            .collect()
    }

    pub fn test_targets(&self) -> Vec<f64> {
        self.test_indices
            .iter()
            .map(|&i| self.dataset.targets[i])
            .collect()
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn fingerprint(schema: &FeatureSchema, records: &[Record], targets: &[f64]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (record, target) in records.iter().zip(targets) {
        for &column in schema.numerical {
            if let Some(v) = record.numeric(column) {
                hasher.update(&v.to_le_bytes());
            }
        }
        for &column in schema.categorical {
            if let Some(FieldValue::Categorical(s)) = record.get(column) {
                hasher.update(&(s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
        }
        hasher.update(&target.to_le_bytes());
    }
    hex::encode(hasher.finalize().as_bytes())
}

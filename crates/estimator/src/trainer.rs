//! Fit-once training orchestration
//!
//! Splits the dataset, fits the preprocessor and the forest on the training
//! partition, and publishes the result in a single-flight cell. The first
//! caller performs the fit; concurrent callers block until it completes and
//! then share the same `Arc`. A failed fit publishes nothing.

use chrono::Utc;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::config::SplitConfig;
use crate::dataset::Dataset;
use crate::errors::{EstimatorError, Result};
use crate::forest::{ForestConfig, RandomForestRegressor};
use crate::pipeline::{FittedPipeline, PipelineMetadata};
use crate::preprocessing::Preprocessor;

/// Training parameters
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingParams {
    pub split: SplitConfig,
    pub forest: ForestConfig,
}

/// Fit the full pipeline on the training partition of `dataset`.
///
/// No caching; see [`TrainingOrchestrator`] for the memoized entry point.
#[instrument(skip(dataset, params), fields(rows = dataset.len()))]
pub fn fit_pipeline(dataset: &Dataset, params: &TrainingParams) -> Result<FittedPipeline> {
    let start = Instant::now();
    let split = dataset.train_test_split(params.split.test_fraction, params.split.seed)?;
    let train_records = split.train_records();
    let train_targets = split.train_targets();

    info!(
        "Fitting pipeline on {} training rows ({} held out)",
        train_records.len(),
        split.test_indices.len()
    );

    let preprocessor = Preprocessor::fit(dataset.schema(), &train_records)?;
    let matrix = preprocessor.transform_batch(&train_records)?;
    let forest = RandomForestRegressor::fit(&params.forest, &matrix, &train_targets)?;

    let metadata = PipelineMetadata {
        dataset_fingerprint: dataset.fingerprint().to_string(),
        train_rows: train_records.len(),
        test_rows: split.test_indices.len(),
        feature_count: preprocessor.output_width(),
        tree_count: forest.trees().len(),
        trained_at: Utc::now().timestamp(),
        fit_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Pipeline ready: {} features, {} trees, {} ms",
        metadata.feature_count, metadata.tree_count, metadata.fit_duration_ms
    );

    Ok(FittedPipeline {
        preprocessor,
        forest,
        metadata,
    })
}

/// Process-lifetime memoization of the fitted pipeline.
pub struct TrainingOrchestrator {
    params: TrainingParams,
    cell: OnceCell<Arc<FittedPipeline>>,
    fits: AtomicUsize,
}

impl TrainingOrchestrator {
    pub fn new(params: TrainingParams) -> Self {
        Self {
            params,
            cell: OnceCell::new(),
            fits: AtomicUsize::new(0),
        }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Return the fitted pipeline, fitting it on first use.
    ///
    /// Fails with [`EstimatorError::DatasetMismatch`] if the pipeline was
    /// already fitted on a dataset with different content.
    pub fn fitted(&self, dataset: &Dataset) -> Result<Arc<FittedPipeline>> {
        let pipeline = self.cell.get_or_try_init(|| {
            self.fits.fetch_add(1, Ordering::SeqCst);
            fit_pipeline(dataset, &self.params).map(Arc::new)
        })?;

        if pipeline.metadata.dataset_fingerprint != dataset.fingerprint() {
            return Err(EstimatorError::DatasetMismatch {
                expected: pipeline.metadata.dataset_fingerprint.clone(),
                actual: dataset.fingerprint().to_string(),
            });
        }

        Ok(Arc::clone(pipeline))
    }

    /// The pipeline if it has already been fitted.
    pub fn get(&self) -> Option<Arc<FittedPipeline>> {
        self.cell.get().cloned()
    }

    /// Number of fits started so far.
    pub fn fit_count(&self) -> usize {
        self.fits.load(Ordering::SeqCst)
    }
}

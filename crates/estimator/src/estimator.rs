//! Request-facing estimator: lazy dataset, fit-once pipeline, adjusted predictions.

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info};

use crate::adjuster::PriceAdjuster;
use crate::config::EstimatorConfig;
use crate::dataset::Dataset;
use crate::errors::{EstimatorError, Result};
use crate::pipeline::{FittedPipeline, Prediction};
use crate::record::Record;
use crate::schema::{fixed_choices, ColumnRole, FeatureSchema};
use crate::trainer::{TrainingOrchestrator, TrainingParams};

static GLOBAL: OnceCell<HousePriceEstimator> = OnceCell::new();

/// House price estimator over one dataset.
///
/// The dataset is loaded and the pipeline fitted at most once per instance;
/// both steps are single-flight under concurrent first access.
pub struct HousePriceEstimator {
    config: EstimatorConfig,
    schema: &'static FeatureSchema,
    dataset: OnceCell<Arc<Dataset>>,
    orchestrator: TrainingOrchestrator,
}

impl HousePriceEstimator {
    /// Estimator reading the dataset named in `config` on first use.
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        let schema = FeatureSchema::housing();
        schema.validate()?;

        let params = TrainingParams {
            split: config.split.clone(),
            forest: config.forest.clone(),
        };

        Ok(Self {
            config,
            schema,
            dataset: OnceCell::new(),
            orchestrator: TrainingOrchestrator::new(params),
        })
    }

    /// Estimator over an already loaded dataset; `config.dataset` is ignored.
    pub fn with_dataset(config: EstimatorConfig, dataset: Dataset) -> Result<Self> {
        let estimator = Self {
            schema: dataset.schema(),
            ..Self::new(config)?
        };
        estimator
            .dataset
            .set(Arc::new(dataset))
            .map_err(|_| EstimatorError::Dataset("dataset already initialised".into()))?;
        Ok(estimator)
    }

    /// Process-wide estimator. The first call's configuration wins.
    pub fn global(config: EstimatorConfig) -> Result<&'static HousePriceEstimator> {
        GLOBAL.get_or_try_init(|| Self::new(config))
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn schema(&self) -> &'static FeatureSchema {
        self.schema
    }

    pub fn adjuster(&self) -> &PriceAdjuster {
        &self.config.adjustment
    }

    /// The dataset, loading it on first use.
    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        self.dataset
            .get_or_try_init(|| {
                Dataset::from_csv(&self.config.dataset.path, self.schema).map(Arc::new)
            })
            .cloned()
    }

    /// The fitted pipeline, training it on first use.
    pub fn pipeline(&self) -> Result<Arc<FittedPipeline>> {
        if let Some(pipeline) = self.orchestrator.get() {
            return Ok(pipeline);
        }
        let dataset = self.dataset()?;
        self.orchestrator.fitted(&dataset)
    }

    /// Number of pipeline fits performed by this estimator.
    pub fn fit_count(&self) -> usize {
        self.orchestrator.fit_count()
    }

    /// Estimate the price for one fully populated record.
    ///
    /// A malformed record is rejected before the shared pipeline is touched.
    pub fn predict(&self, record: &Record) -> Result<Prediction> {
        self.schema.check_record(record)?;
        let pipeline = self.pipeline()?;
        let prediction = pipeline.predict(self.schema, self.adjuster(), record)?;

        debug!(
            raw = prediction.raw,
            multiplier = prediction.multiplier,
            property_type = %prediction.property_type,
            "prediction"
        );
        Ok(prediction)
    }

    /// Choices offered for a categorical input.
    ///
    /// Fixed vocabularies (transport tier, yes/no flags) are returned as-is;
    /// other columns list the sorted distinct values in the dataset.
    pub fn category_options(&self, column: &str) -> Result<Vec<String>> {
        if self.schema.role_of(column) != Some(ColumnRole::Categorical) {
            return Err(EstimatorError::InputShape(format!(
                "`{column}` is not a categorical column"
            )));
        }
        if let Some(choices) = fixed_choices(column) {
            return Ok(choices.iter().map(|c| c.to_string()).collect());
        }
        let options = self.dataset()?.categories(column);
        info!("{} options for {}", options.len(), column);
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestConfig;
    use crate::testing::{housing_csv, sample_rows, SampleRow};

    fn config() -> EstimatorConfig {
        EstimatorConfig {
            forest: ForestConfig {
                n_estimators: 10,
                ..ForestConfig::default()
            },
            ..EstimatorConfig::default()
        }
    }

    fn estimator() -> HousePriceEstimator {
        let dataset =
            Dataset::from_reader(housing_csv(&sample_rows()).as_bytes(), FeatureSchema::housing())
                .unwrap();
        HousePriceEstimator::with_dataset(config(), dataset).unwrap()
    }

    #[test]
    fn test_predict_applies_adjustment() -> Result<()> {
        let estimator = estimator();
        let record = SampleRow::reference().to_record();

        let apartment = estimator.predict(&record)?;
        assert_eq!(apartment.multiplier, 0.95);
        assert!((apartment.price - apartment.raw * 0.95).abs() < 1e-9);

        let villa = estimator.predict(&record.clone().with("Property_Type", "Villa"))?;
        assert_eq!(villa.multiplier, 1.25);
        assert!((villa.price - villa.raw * 1.25).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn test_input_shape_error_is_isolated() -> Result<()> {
        let estimator = estimator();
        let mut broken = SampleRow::reference().to_record();
        broken.remove("BHK");

        assert!(matches!(
            estimator.predict(&broken),
            Err(EstimatorError::InputShape(_))
        ));
        // Rejected before any fit was needed
        assert_eq!(estimator.fit_count(), 0);

        // The estimator keeps serving valid requests
        estimator.predict(&SampleRow::reference().to_record())?;
        assert_eq!(estimator.fit_count(), 1);

        Ok(())
    }

    #[test]
    fn test_category_options() -> Result<()> {
        let estimator = estimator();

        assert_eq!(
            estimator.category_options("Public_Transport_Accessibility")?,
            vec!["Low", "Medium", "High"]
        );
        assert_eq!(
            estimator.category_options("Property_Type")?,
            vec!["Apartment", "Independent House", "Villa"]
        );
        assert!(estimator.category_options("BHK").is_err());

        Ok(())
    }

    #[test]
    fn test_missing_dataset_file() {
        let mut config = config();
        config.dataset.path = "/nonexistent/houses.csv".into();
        let estimator = HousePriceEstimator::new(config).unwrap();

        assert!(matches!(
            estimator.predict(&SampleRow::reference().to_record()),
            Err(EstimatorError::Dataset(_))
        ));
    }
}

//! Integration tests for the house price estimator
//!
//! Exercise the full path: CSV on disk → schema validation → split →
//! fit-once pipeline → adjusted prediction.

use anyhow::Result;
use house_price_estimator::testing::{housing_csv, sample_rows, SampleRow};
use house_price_estimator::{
    Dataset, EstimatorConfig, EstimatorError, FeatureSchema, ForestConfig, HousePriceEstimator,
    SchemaError,
};
use std::io::Write;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::NamedTempFile;

fn write_csv(rows: &[SampleRow]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{}", housing_csv(rows))?;
    file.flush()?;
    Ok(file)
}

fn config_for(file: &NamedTempFile, trees: usize) -> EstimatorConfig {
    let mut config = EstimatorConfig {
        forest: ForestConfig {
            n_estimators: trees,
            ..ForestConfig::default()
        },
        ..EstimatorConfig::default()
    };
    config.dataset.path = file.path().to_path_buf();
    config
}

#[test]
fn test_repeated_predictions_identical() -> Result<()> {
    let file = write_csv(&sample_rows())?;
    let estimator = HousePriceEstimator::new(config_for(&file, 20))?;
    let record = SampleRow::reference().to_record();

    let first = estimator.predict(&record)?;
    let second = estimator.predict(&record)?;

    assert_eq!(first, second);
    assert_eq!(estimator.fit_count(), 1);

    Ok(())
}

#[test]
fn test_independent_estimators_agree() -> Result<()> {
    // Same data and seed in two "processes" give the same answer
    let file = write_csv(&sample_rows())?;
    let a = HousePriceEstimator::new(config_for(&file, 20))?;
    let b = HousePriceEstimator::new(config_for(&file, 20))?;
    let record = SampleRow::reference().to_record();

    assert_eq!(a.predict(&record)?.raw, b.predict(&record)?.raw);

    Ok(())
}

#[test]
fn test_single_row_dataset() -> Result<()> {
    let file = write_csv(&[SampleRow::reference()])?;
    let estimator = HousePriceEstimator::new(config_for(&file, 100))?;
    let record = SampleRow::reference().to_record();

    let prediction = estimator.predict(&record)?;
    let pipeline = estimator.pipeline()?;

    assert_eq!(pipeline.metadata().train_rows, 1);
    assert_eq!(pipeline.metadata().test_rows, 0);
    assert_eq!(prediction.raw, pipeline.predict_raw(&record)?);
    // Every tree is a single leaf holding the only target
    assert!((prediction.raw - 120.0).abs() < 1e-9);
    assert!((prediction.price - prediction.raw * 0.95).abs() < 1e-9);
    assert_eq!(format!("{prediction}"), "114.00");

    Ok(())
}

#[test]
fn test_adjustment_multipliers_end_to_end() -> Result<()> {
    let file = write_csv(&sample_rows())?;
    let estimator = HousePriceEstimator::new(config_for(&file, 15))?;
    let base = SampleRow::reference().to_record();

    for (property_type, multiplier) in [
        ("Villa", 1.25),
        ("Independent House", 1.15),
        ("Apartment", 0.95),
        ("", 0.95),
        ("Penthouse", 0.95),
    ] {
        let record = base.clone().with("Property_Type", property_type);
        let pipeline = estimator.pipeline()?;
        let raw = pipeline.predict_raw(&record)?;
        let prediction = estimator.predict(&record)?;

        assert_eq!(prediction.raw, raw);
        assert!(
            (prediction.price - raw * multiplier).abs() < 1e-9,
            "{property_type}: {} vs {}",
            prediction.price,
            raw * multiplier
        );
    }

    Ok(())
}

#[test]
fn test_bhk_extremes() -> Result<()> {
    let file = write_csv(&sample_rows())?;
    let estimator = HousePriceEstimator::new(config_for(&file, 10))?;

    for bhk in [1.0, 6.0] {
        let record = SampleRow::reference().to_record().with("BHK", bhk);
        let prediction = estimator.predict(&record)?;
        assert!(prediction.price.is_finite());
    }

    Ok(())
}

#[test]
fn test_unseen_categories_tolerated() -> Result<()> {
    let file = write_csv(&sample_rows())?;
    let estimator = HousePriceEstimator::new(config_for(&file, 10))?;
    let record = SampleRow::reference()
        .to_record()
        .with("State", "Ladakh")
        .with("Furnished_Status", "Partly");

    let prediction = estimator.predict(&record)?;
    assert!(prediction.price.is_finite());

    Ok(())
}

#[test]
fn test_concurrent_first_access_fits_once() -> Result<()> {
    let file = write_csv(&sample_rows())?;
    let estimator = Arc::new(HousePriceEstimator::new(config_for(&file, 25))?);
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let estimator = Arc::clone(&estimator);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                estimator.pipeline().map(|p| Arc::as_ptr(&p) as usize)
            })
        })
        .collect();

    let mut pointers = Vec::new();
    for handle in handles {
        let pointer = handle.join().expect("worker panicked")?;
        pointers.push(pointer);
    }

    assert_eq!(estimator.fit_count(), 1);
    assert!(pointers.windows(2).all(|w| w[0] == w[1]));

    Ok(())
}

#[test]
fn test_schema_errors_are_fatal() -> Result<()> {
    let mut rows = sample_rows();
    rows[5].target = "expensive".into();
    let file = write_csv(&rows)?;
    let estimator = HousePriceEstimator::new(config_for(&file, 5))?;

    let err = estimator
        .predict(&SampleRow::reference().to_record())
        .unwrap_err();
    assert!(matches!(
        err,
        EstimatorError::Schema(SchemaError::NonNumericTarget { .. })
    ));
    assert!(estimator.pipeline().is_err());
    assert_eq!(estimator.fit_count(), 0);

    Ok(())
}

#[test]
fn test_dataset_loaded_from_disk() -> Result<()> {
    let file = write_csv(&sample_rows())?;
    let dataset = Dataset::from_csv(file.path(), FeatureSchema::housing())?;

    assert_eq!(dataset.len(), 40);
    assert_eq!(dataset.header().len(), 23);
    assert_eq!(
        dataset.categories("State"),
        vec!["DL", "KA", "MH", "TN"]
    );

    Ok(())
}

//! Random forest regressor
//!
//! Bagged CART trees: each tree sees a bootstrap sample of the training rows
//! and a random subset of candidate features at every split. The prediction
//! is the arithmetic mean of all tree outputs.
//!
//! Trees are trained in parallel with rayon. Every tree draws from its own RNG
//! derived from `(seed, tree_index)` and results are collected in tree order,
//! so the fitted forest does not depend on the number of worker threads.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::cart::{CartBuilder, TreeConfig};
use crate::deterministic::tree_rng;
use crate::errors::{EstimatorError, Result};
use crate::tree::Tree;

/// How many candidate features are examined at each split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    /// Fraction of the feature count, in (0, 1].
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolve against the number of features; at least 1.
    pub fn resolve(&self, feature_count: usize) -> usize {
        let n = feature_count as f64;
        let k = match self {
            MaxFeatures::All => feature_count,
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::Fraction(f) => (f * n).floor() as usize,
        };
        k.clamp(1, feature_count.max(1))
    }
}

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
    /// Dedicated worker threads; `None` uses the global rayon pool.
    pub n_jobs: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Fraction(1.0 / 3.0),
            bootstrap: true,
            seed: 42,
            n_jobs: None,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(EstimatorError::Config("n_estimators must be > 0".into()));
        }
        if self.min_samples_split < 2 {
            return Err(EstimatorError::Config(
                "min_samples_split must be >= 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(EstimatorError::Config("min_samples_leaf must be >= 1".into()));
        }
        if let MaxFeatures::Fraction(f) = self.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(EstimatorError::Config(format!(
                    "max_features fraction must be in (0, 1], got {f}"
                )));
            }
        }
        if self.n_jobs == Some(0) {
            return Err(EstimatorError::Config("n_jobs must be >= 1".into()));
        }
        Ok(())
    }
}

/// Fitted random forest. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<Tree>,
    feature_count: usize,
}

impl RandomForestRegressor {
    /// Fit a forest on a dense feature matrix.
    #[instrument(skip(config, features, targets), fields(rows = features.len(), trees = config.n_estimators))]
    pub fn fit(config: &ForestConfig, features: &[Vec<f64>], targets: &[f64]) -> Result<Self> {
        config.validate()?;

        if features.is_empty() {
            return Err(EstimatorError::Training("no training rows".into()));
        }
        if features.len() != targets.len() {
            return Err(EstimatorError::Training(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        let feature_count = features[0].len();
        if let Some(row) = features.iter().position(|r| r.len() != feature_count) {
            return Err(EstimatorError::Training(format!(
                "row {row} has {} features, expected {feature_count}",
                features[row].len()
            )));
        }
        if features.iter().flatten().any(|v| !v.is_finite()) {
            return Err(EstimatorError::Training("non-finite feature value".into()));
        }
        if targets.iter().any(|t| !t.is_finite()) {
            return Err(EstimatorError::Training("non-finite target value".into()));
        }

        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features.resolve(feature_count),
        };
        debug!(
            "Tree config: max_features={} of {} features",
            tree_config.max_features, feature_count
        );

        let start = Instant::now();
        let builder = CartBuilder::new(features, targets, tree_config);
        let trees = match config.n_jobs {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|err| EstimatorError::Training(format!("thread pool: {err}")))?;
                pool.install(|| grow_trees(&builder, config, features.len()))
            }
            None => grow_trees(&builder, config, features.len()),
        };

        info!(
            "Trained {} trees on {} rows in {} ms",
            trees.len(),
            features.len(),
            start.elapsed().as_millis()
        );

        Ok(Self {
            trees,
            feature_count,
        })
    }

    /// Mean of all tree outputs.
    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.feature_count {
            return Err(EstimatorError::InputShape(format!(
                "expected {} features, got {}",
                self.feature_count,
                features.len()
            )));
        }
        let sum: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }
}

fn grow_trees(builder: &CartBuilder<'_>, config: &ForestConfig, n_rows: usize) -> Vec<Tree> {
    (0..config.n_estimators)
        .into_par_iter()
        .map(|tree_idx| {
            let mut rng = tree_rng(config.seed, tree_idx);
            let sample: Vec<usize> = if config.bootstrap {
                (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
            } else {
                (0..n_rows).collect()
            };
            builder.build(&sample, &mut rng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let features: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![i as f64, (i % 4) as f64, ((i * 7) % 11) as f64])
            .collect();
        let targets: Vec<f64> = features.iter().map(|r| 3.0 * r[0] + 10.0 * r[1]).collect();
        (features, targets)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_estimators: 12,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::All.resolve(33), 33);
        assert_eq!(MaxFeatures::Sqrt.resolve(33), 5);
        assert_eq!(MaxFeatures::Log2.resolve(33), 5);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(33), 16);
        assert_eq!(MaxFeatures::Fraction(0.01).resolve(3), 1);
    }

    #[test]
    fn test_fit_and_predict() -> Result<()> {
        let (features, targets) = linear_data();
        let forest = RandomForestRegressor::fit(&small_config(), &features, &targets)?;

        assert_eq!(forest.trees().len(), 12);
        for tree in forest.trees() {
            assert!(tree.validate().is_ok());
        }

        let pred = forest.predict(&features[30])?;
        assert!((pred - targets[30]).abs() < 30.0, "prediction {pred}");

        Ok(())
    }

    #[test]
    fn test_prediction_is_mean_of_trees() -> Result<()> {
        let (features, targets) = linear_data();
        let forest = RandomForestRegressor::fit(&small_config(), &features, &targets)?;

        let row = &features[17];
        let mean = forest.trees().iter().map(|t| t.evaluate(row)).sum::<f64>()
            / forest.trees().len() as f64;
        assert_eq!(forest.predict(row)?, mean);

        Ok(())
    }

    #[test]
    fn test_seed_determinism() -> Result<()> {
        let (features, targets) = linear_data();
        let a = RandomForestRegressor::fit(&small_config(), &features, &targets)?;
        let b = RandomForestRegressor::fit(&small_config(), &features, &targets)?;
        assert_eq!(a, b);

        let other_seed = ForestConfig {
            seed: 7,
            ..small_config()
        };
        let c = RandomForestRegressor::fit(&other_seed, &features, &targets)?;
        assert_ne!(a, c);

        Ok(())
    }

    #[test]
    fn test_thread_count_does_not_change_forest() -> Result<()> {
        let (features, targets) = linear_data();
        let single = ForestConfig {
            n_jobs: Some(1),
            ..small_config()
        };
        let many = ForestConfig {
            n_jobs: Some(4),
            ..small_config()
        };

        let a = RandomForestRegressor::fit(&single, &features, &targets)?;
        let b = RandomForestRegressor::fit(&many, &features, &targets)?;
        assert_eq!(a, b);

        Ok(())
    }

    #[test]
    fn test_training_failures() {
        let config = small_config();
        assert!(matches!(
            RandomForestRegressor::fit(&config, &[], &[]),
            Err(EstimatorError::Training(_))
        ));
        assert!(matches!(
            RandomForestRegressor::fit(&config, &[vec![1.0]], &[f64::NAN]),
            Err(EstimatorError::Training(_))
        ));
        assert!(matches!(
            RandomForestRegressor::fit(&config, &[vec![1.0], vec![2.0]], &[1.0]),
            Err(EstimatorError::Training(_))
        ));

        let no_trees = ForestConfig {
            n_estimators: 0,
            ..small_config()
        };
        assert!(RandomForestRegressor::fit(&no_trees, &[vec![1.0]], &[1.0]).is_err());
    }

    #[test]
    fn test_predict_checks_width() -> Result<()> {
        let (features, targets) = linear_data();
        let forest = RandomForestRegressor::fit(&small_config(), &features, &targets)?;
        assert!(matches!(
            forest.predict(&[1.0]),
            Err(EstimatorError::InputShape(_))
        ));
        Ok(())
    }
}

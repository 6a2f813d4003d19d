//! Zero-mean, unit-variance standardization of numerical columns.

use serde::{Deserialize, Serialize};

use crate::errors::{EstimatorError, Result};

/// Frozen per-column standardization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub columns: Vec<String>,
    pub means: Vec<f64>,
    /// Population standard deviation; 1.0 for constant columns.
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Compute means and scales from training rows.
    ///
    /// `rows[i][j]` is the value of `columns[j]` in training row `i`.
    pub fn fit(columns: &[&str], rows: &[Vec<f64>]) -> Result<Self> {
        let n = columns.len();
        if rows.is_empty() {
            return Err(EstimatorError::Training(
                "cannot fit scaler on zero rows".into(),
            ));
        }

        let mut means = vec![0.0; n];
        for row in rows {
            if row.len() != n {
                return Err(EstimatorError::Training(format!(
                    "scaler expected {} values per row, got {}",
                    n,
                    row.len()
                )));
            }
            for (mean, &v) in means.iter_mut().zip(row) {
                *mean += v;
            }
        }
        let count = rows.len() as f64;
        for mean in &mut means {
            *mean /= count;
        }

        let mut scales = vec![0.0; n];
        for row in rows {
            for (j, &v) in row.iter().enumerate() {
                let diff = v - means[j];
                scales[j] += diff * diff;
            }
        }
        for scale in &mut scales {
            let std = (*scale / count).sqrt();
            *scale = if std > f64::EPSILON { std } else { 1.0 };
        }

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            means,
            scales,
        })
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Standardize one value of column `idx`.
    pub fn transform_value(&self, idx: usize, value: f64) -> f64 {
        (value - self.means[idx]) / self.scales[idx]
    }

    /// Standardize a full row of raw values, appending to `out`.
    pub fn transform_into(&self, values: &[f64], out: &mut Vec<f64>) {
        out.extend(
            values
                .iter()
                .enumerate()
                .map(|(idx, &v)| self.transform_value(idx, v)),
        );
    }
}

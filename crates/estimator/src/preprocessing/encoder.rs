//! One-hot encoding of categorical columns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Observed vocabulary of one categorical column, sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub column: String,
    pub categories: Vec<String>,
}

impl CategoryVocabulary {
    pub fn position(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }
}

/// Frozen one-hot encoder over an ordered list of categorical columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub vocabularies: Vec<CategoryVocabulary>,
}

impl OneHotEncoder {
    /// Collect the categories observed in the training rows.
    ///
    /// `rows[i][j]` is the value of `columns[j]` in training row `i`.
    pub fn fit(columns: &[&str], rows: &[Vec<&str>]) -> Self {
        let vocabularies = columns
            .iter()
            .enumerate()
            .map(|(j, column)| {
                let seen: BTreeSet<&str> = rows.iter().filter_map(|r| r.get(j).copied()).collect();
                CategoryVocabulary {
                    column: column.to_string(),
                    categories: seen.into_iter().map(str::to_string).collect(),
                }
            })
            .collect();

        Self { vocabularies }
    }

    /// Total number of indicator columns.
    pub fn width(&self) -> usize {
        self.vocabularies.iter().map(|v| v.categories.len()).sum()
    }

    /// Append one indicator block per column to `out`.
    ///
    /// A value outside the training vocabulary yields an all-zero block.
    pub fn transform_into(&self, values: &[&str], out: &mut Vec<f64>) {
        for (vocab, value) in self.vocabularies.iter().zip(values) {
            let start = out.len();
            out.resize(start + vocab.categories.len(), 0.0);
            match vocab.position(value) {
                Some(pos) => out[start + pos] = 1.0,
                None => debug!(
                    column = %vocab.column,
                    value = %value,
                    "unseen category, encoding as all-zero block"
                ),
            }
        }
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|v| {
                v.categories
                    .iter()
                    .map(move |c| format!("cat__{}_{}", v.column, c))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> OneHotEncoder {
        let rows = vec![vec!["MH", "Villa"], vec!["KA", "Apartment"], vec!["MH", "Apartment"]];
        OneHotEncoder::fit(&["State", "Property_Type"], &rows)
    }

    #[test]
    fn test_vocabulary_sorted() {
        let enc = encoder();
        assert_eq!(enc.vocabularies[0].categories, vec!["KA", "MH"]);
        assert_eq!(enc.vocabularies[1].categories, vec!["Apartment", "Villa"]);
        assert_eq!(enc.width(), 4);
    }

    #[test]
    fn test_known_categories() {
        let mut out = Vec::new();
        encoder().transform_into(&["MH", "Villa"], &mut out);
        assert_eq!(out, vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unseen_category_is_zero_block() {
        let mut out = Vec::new();
        encoder().transform_into(&["GOA", "Apartment"], &mut out);
        assert_eq!(out, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_feature_names() {
        assert_eq!(
            encoder().feature_names(),
            vec![
                "cat__State_KA",
                "cat__State_MH",
                "cat__Property_Type_Apartment",
                "cat__Property_Type_Villa"
            ]
        );
    }
}

//! Feature schema: the static partition of dataset columns into roles.

use std::collections::BTreeSet;

use crate::errors::{EstimatorError, Result, SchemaError};
use crate::record::{FieldValue, Record};

/// Role a dataset column plays in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Target,
    Excluded,
    Numerical,
    Categorical,
}

/// Declarative column partition.
///
/// `numerical` and `categorical` are ordered; that order fixes the layout of
/// the preprocessed feature vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    pub target: &'static str,
    pub excluded: &'static [&'static str],
    pub numerical: &'static [&'static str],
    pub categorical: &'static [&'static str],
    /// Categorical column whose raw request value drives the price adjuster.
    pub adjustment_column: &'static str,
}

static HOUSING: FeatureSchema = FeatureSchema {
    target: "Price_in_Lakhs",
    excluded: &[
        "ID",
        "City",
        "Locality",
        "Price_per_SqFt",
        "Amenities",
        "Facing",
        "Owner_Type",
    ],
    numerical: &[
        "BHK",
        "Size_in_SqFt",
        "Year_Built",
        "Floor_No",
        "Total_Floors",
        "Age_of_Property",
        "Nearby_Schools",
        "Nearby_Hospitals",
    ],
    categorical: &[
        "State",
        "Property_Type",
        "Furnished_Status",
        "Public_Transport_Accessibility",
        "Parking_Space",
        "Security",
        "Availability_Status",
    ],
    adjustment_column: "Property_Type",
};

impl FeatureSchema {
    /// Reference schema for the Indian housing prices dataset.
    pub fn housing() -> &'static FeatureSchema {
        &HOUSING
    }

    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        if self.target == column {
            Some(ColumnRole::Target)
        } else if self.excluded.contains(&column) {
            Some(ColumnRole::Excluded)
        } else if self.numerical.contains(&column) {
            Some(ColumnRole::Numerical)
        } else if self.categorical.contains(&column) {
            Some(ColumnRole::Categorical)
        } else {
            None
        }
    }

    /// Every declared column, target first.
    pub fn declared_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.target)
            .chain(self.excluded.iter().copied())
            .chain(self.numerical.iter().copied())
            .chain(self.categorical.iter().copied())
    }

    /// Number of model input columns (numerical + categorical).
    pub fn input_column_count(&self) -> usize {
        self.numerical.len() + self.categorical.len()
    }

    /// Checks that the four roles are disjoint and the adjustment column is categorical.
    pub fn validate(&self) -> std::result::Result<(), SchemaError> {
        if self.target.is_empty() {
            return Err(SchemaError::EmptyTarget);
        }

        let mut seen = BTreeSet::new();
        for column in self.declared_columns() {
            if !seen.insert(column) {
                return Err(SchemaError::DuplicateColumn(column.to_string()));
            }
        }

        if !self.categorical.contains(&self.adjustment_column) {
            return Err(SchemaError::InvalidAdjustmentColumn(
                self.adjustment_column.to_string(),
            ));
        }

        Ok(())
    }

    /// Checks a dataset header against the schema: the declared columns and
    /// the header must be the same set, with no column repeated.
    pub fn validate_header<S: AsRef<str>>(&self, header: &[S]) -> std::result::Result<(), SchemaError> {
        self.validate()?;

        let mut present = BTreeSet::new();
        for column in header {
            let column = column.as_ref();
            if !present.insert(column) {
                return Err(SchemaError::DuplicateColumn(column.to_string()));
            }
        }

        for column in self.declared_columns() {
            if !present.contains(column) {
                return Err(SchemaError::MissingColumn(column.to_string()));
            }
        }

        for column in header {
            let column = column.as_ref();
            if self.role_of(column).is_none() {
                return Err(SchemaError::UnclassifiedColumn(column.to_string()));
            }
        }

        Ok(())
    }

    /// Input-shape check for a prediction record.
    ///
    /// Every numerical and categorical column must be present with the
    /// matching kind. Extra fields are ignored. Category values are not
    /// checked against any vocabulary.
    pub fn check_record(&self, record: &Record) -> Result<()> {
        for &column in self.numerical {
            match record.get(column) {
                Some(FieldValue::Numeric(v)) if v.is_finite() => {}
                Some(FieldValue::Numeric(v)) => {
                    return Err(EstimatorError::InputShape(format!(
                        "field `{column}` is not finite ({v})"
                    )))
                }
                Some(FieldValue::Categorical(_)) => {
                    return Err(EstimatorError::InputShape(format!(
                        "field `{column}` must be numeric"
                    )))
                }
                None => {
                    return Err(EstimatorError::InputShape(format!(
                        "missing field `{column}`"
                    )))
                }
            }
        }

        for &column in self.categorical {
            match record.get(column) {
                Some(FieldValue::Categorical(_)) => {}
                Some(FieldValue::Numeric(_)) => {
                    return Err(EstimatorError::InputShape(format!(
                        "field `{column}` must be categorical"
                    )))
                }
                None => {
                    return Err(EstimatorError::InputShape(format!(
                        "missing field `{column}`"
                    )))
                }
            }
        }

        Ok(())
    }
}

/// Inclusive range accepted by the input form for one numerical column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericBound {
    pub column: &'static str,
    pub min: i64,
    pub max: i64,
    pub default: i64,
}

/// Ranges enforced by the input form for the numerical columns.
///
/// The core pipeline does not re-validate these; they live here so the form
/// front end and its tests share one definition.
pub static INPUT_BOUNDS: [NumericBound; 8] = [
    NumericBound { column: "BHK", min: 1, max: 6, default: 2 },
    NumericBound { column: "Size_in_SqFt", min: 500, max: 6000, default: 1200 },
    NumericBound { column: "Year_Built", min: 1980, max: 2024, default: 2010 },
    NumericBound { column: "Floor_No", min: 0, max: 30, default: 2 },
    NumericBound { column: "Total_Floors", min: 1, max: 40, default: 10 },
    NumericBound { column: "Age_of_Property", min: 0, max: 50, default: 10 },
    NumericBound { column: "Nearby_Schools", min: 0, max: 20, default: 5 },
    NumericBound { column: "Nearby_Hospitals", min: 0, max: 20, default: 3 },
];

pub const TRANSPORT_TIERS: &[&str] = &["Low", "Medium", "High"];
pub const YES_NO: &[&str] = &["Yes", "No"];

pub fn numeric_bound(column: &str) -> Option<&'static NumericBound> {
    INPUT_BOUNDS.iter().find(|b| b.column == column)
}

/// Fixed vocabulary for a categorical column, if the form uses one instead
/// of the dataset's observed values.
pub fn fixed_choices(column: &str) -> Option<&'static [&'static str]> {
    match column {
        "Public_Transport_Accessibility" => Some(TRANSPORT_TIERS),
        "Parking_Space" | "Security" => Some(YES_NO),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn housing_header() -> Vec<&'static str> {
        FeatureSchema::housing().declared_columns().collect()
    }

    fn full_record() -> Record {
        let schema = FeatureSchema::housing();
        let mut record = Record::new();
        for &c in schema.numerical {
            record.insert(c, 1.0);
        }
        for &c in schema.categorical {
            record.insert(c, "x");
        }
        record
    }

    #[test]
    fn test_housing_schema_is_valid() {
        let schema = FeatureSchema::housing();
        assert!(schema.validate().is_ok());
        assert_eq!(schema.numerical.len(), 8);
        assert_eq!(schema.categorical.len(), 7);
        assert_eq!(schema.role_of("Price_in_Lakhs"), Some(ColumnRole::Target));
        assert_eq!(schema.role_of("Amenities"), Some(ColumnRole::Excluded));
        assert_eq!(schema.role_of("BHK"), Some(ColumnRole::Numerical));
        assert_eq!(schema.role_of("State"), Some(ColumnRole::Categorical));
        assert_eq!(schema.role_of("Nope"), None);
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let schema = FeatureSchema {
            target: "price",
            excluded: &[],
            numerical: &["size", "kind"],
            categorical: &["kind"],
            adjustment_column: "kind",
        };
        assert_eq!(
            schema.validate(),
            Err(SchemaError::DuplicateColumn("kind".into()))
        );
    }

    #[test]
    fn test_adjustment_column_must_be_categorical() {
        let schema = FeatureSchema {
            target: "price",
            excluded: &[],
            numerical: &["size"],
            categorical: &["kind"],
            adjustment_column: "size",
        };
        assert_eq!(
            schema.validate(),
            Err(SchemaError::InvalidAdjustmentColumn("size".into()))
        );
    }

    #[test]
    fn test_header_matches() {
        assert!(FeatureSchema::housing()
            .validate_header(&housing_header())
            .is_ok());
    }

    #[test]
    fn test_header_missing_column() {
        let header: Vec<_> = housing_header()
            .into_iter()
            .filter(|c| *c != "Security")
            .collect();
        assert_eq!(
            FeatureSchema::housing().validate_header(&header),
            Err(SchemaError::MissingColumn("Security".into()))
        );
    }

    #[test]
    fn test_header_duplicate_column() {
        let mut header = housing_header();
        header.push("BHK");
        assert_eq!(
            FeatureSchema::housing().validate_header(&header),
            Err(SchemaError::DuplicateColumn("BHK".into()))
        );
    }

    #[test]
    fn test_header_unclassified_column() {
        let mut header = housing_header();
        header.push("Garden_Size");
        assert_eq!(
            FeatureSchema::housing().validate_header(&header),
            Err(SchemaError::UnclassifiedColumn("Garden_Size".into()))
        );
    }

    #[test]
    fn test_check_record() {
        let schema = FeatureSchema::housing();
        assert!(schema.check_record(&full_record()).is_ok());

        let mut missing = full_record();
        missing.remove("Nearby_Hospitals");
        assert!(matches!(
            schema.check_record(&missing),
            Err(EstimatorError::InputShape(msg)) if msg.contains("Nearby_Hospitals")
        ));

        let wrong_kind = full_record().with("State", 4.0);
        assert!(matches!(
            schema.check_record(&wrong_kind),
            Err(EstimatorError::InputShape(_))
        ));

        let nan = full_record().with("BHK", f64::NAN);
        assert!(schema.check_record(&nan).is_err());
    }

    #[test]
    fn test_input_bounds() {
        let bhk = numeric_bound("BHK").unwrap();
        assert_eq!((bhk.min, bhk.max, bhk.default), (1, 6, 2));
        assert_eq!(fixed_choices("Parking_Space"), Some(&["Yes", "No"][..]));
        assert_eq!(fixed_choices("State"), None);

        // Every bound refers to a numerical schema column
        for bound in INPUT_BOUNDS.iter() {
            assert!(FeatureSchema::housing().numerical.contains(&bound.column));
        }
    }
}

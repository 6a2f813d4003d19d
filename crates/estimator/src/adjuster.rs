//! Property-type price adjustment
//!
//! Rescales the raw forest estimate by a multiplier chosen from the request's
//! property type. The lookup is total: any value without a rule, including
//! the empty string, gets the default multiplier.
//!
//! The multiplier is keyed on the raw request field, not on anything the
//! forest learned. The forest already sees property type through its one-hot
//! block, so the type influences the final price twice.

use serde::{Deserialize, Serialize};

use crate::errors::{EstimatorError, Result};

/// Multiplier for one exact property-type value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    pub property_type: String,
    pub multiplier: f64,
}

/// Rule table plus fallback multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceAdjuster {
    pub rules: Vec<AdjustmentRule>,
    pub default_multiplier: f64,
}

impl Default for PriceAdjuster {
    fn default() -> Self {
        Self {
            rules: vec![
                AdjustmentRule {
                    property_type: "Villa".into(),
                    multiplier: 1.25,
                },
                AdjustmentRule {
                    property_type: "Independent House".into(),
                    multiplier: 1.15,
                },
            ],
            default_multiplier: 0.95,
        }
    }
}

impl PriceAdjuster {
    /// Multiplier for a property type. Matching is exact and case-sensitive.
    pub fn multiplier(&self, property_type: &str) -> f64 {
        self.rules
            .iter()
            .find(|rule| rule.property_type == property_type)
            .map(|rule| rule.multiplier)
            .unwrap_or(self.default_multiplier)
    }

    pub fn adjust(&self, raw_price: f64, property_type: &str) -> f64 {
        raw_price * self.multiplier(property_type)
    }

    pub fn validate(&self) -> Result<()> {
        let finite_positive = |m: f64| m.is_finite() && m > 0.0;
        if !finite_positive(self.default_multiplier) {
            return Err(EstimatorError::Config(format!(
                "default multiplier must be finite and positive, got {}",
                self.default_multiplier
            )));
        }
        for rule in &self.rules {
            if !finite_positive(rule.multiplier) {
                return Err(EstimatorError::Config(format!(
                    "multiplier for `{}` must be finite and positive, got {}",
                    rule.property_type, rule.multiplier
                )));
            }
        }
        Ok(())
    }
}

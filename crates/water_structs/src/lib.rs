//! Common structs for water samples shared across crates.

use serde::{Deserialize, Serialize};

mod criterion;
mod label;
mod risk;

pub use criterion::*;
pub use label::*;
pub use risk::*;

/// The three observed features of a single water sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Presence/absence criterion reported for the sample.
    pub criterion: Criterion,

    /// Percentage measurement.
    pub percentage: f64,

    /// Salt concentration count.
    pub salt_count: f64,
}

impl FeatureRecord {
    /// Creates a record from its three raw feature values.
    #[must_use]
    pub fn new(criterion: impl Into<Criterion>, percentage: f64, salt_count: f64) -> Self {
        Self {
            criterion: criterion.into(),
            percentage,
            salt_count,
        }
    }
}

/// A feature record paired with its ground-truth viability label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub features: FeatureRecord,

    /// Binary viability class (0 or 1) as found in the dataset.
    pub viability: u8,
}

/// Result of classifying one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Contamination status derived from the predicted class.
    #[serde(rename = "prediction")]
    pub label: ContaminationLabel,

    /// Coarse risk tier derived from the class and its confidence.
    pub risk_level: RiskLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_result_wire_names() {
        let result = PredictionResult {
            label: ContaminationLabel::Safe,
            risk_level: RiskLevel::Low,
        };

        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["prediction"], "Safe");
        assert_eq!(json["risk_level"], "Low");
    }

    #[test]
    fn test_feature_record_new() {
        let record = FeatureRecord::new("Present", 19.0, 19000.0);
        assert_eq!(record.criterion, Criterion::Present);
        assert!((record.percentage - 19.0).abs() < f64::EPSILON);
    }
}

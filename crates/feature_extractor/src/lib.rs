//! Feature extractor crate for the water contamination model.
//!
//! This crate fixes the input schema of the model and transforms raw
//! [`FeatureRecord`]s into numeric vectors: the two numeric columns are
//! standardized and the categorical column is one-hot encoded.

use serde::{Deserialize, Serialize};
use water_structs::FeatureRecord;

mod encoder;
mod scaler;

pub use encoder::OneHotEncoder;
pub use scaler::StandardScaler;

/// Dataset column holding the presence/absence criterion.
pub const CRITERIA_COLUMN: &str = "Criteria";

/// Dataset column holding the percentage measurement.
pub const PERCENTAGE_COLUMN: &str = "%percentage";

/// Dataset column holding the salt concentration count.
pub const SALT_COUNT_COLUMN: &str = "Salt_Count";

/// Model input columns, in the order the pipeline was fitted with.
pub const FEATURE_COLUMNS: [&str; 3] = [CRITERIA_COLUMN, PERCENTAGE_COLUMN, SALT_COUNT_COLUMN];

/// Columns that are standardized.
pub const NUMERIC_COLUMNS: [&str; 2] = [PERCENTAGE_COLUMN, SALT_COUNT_COLUMN];

/// Errors raised while fitting or applying a transformation.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("cannot fit a transformation on empty input")]
    EmptyInput,

    #[error("expected {expected} columns, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("{column} must be a finite number, got {value}")]
    NonFinite { column: &'static str, value: f64 },
}

/// Numeric columns of a record, in [`NUMERIC_COLUMNS`] order.
#[must_use]
pub const fn numeric_values(record: &FeatureRecord) -> [f64; 2] {
    [record.percentage, record.salt_count]
}

/// Column transformer applied ahead of the classifier.
///
/// Output layout: the scaled numeric columns, then one column per fitted
/// criterion category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransformer {
    scaler: StandardScaler,
    encoder: OneHotEncoder,
}

impl FeatureTransformer {
    /// Fits the scaler and encoder on training records.
    ///
    /// # Errors
    ///
    /// Returns an error if `records` is empty or holds non-finite values.
    pub fn fit(records: &[FeatureRecord]) -> Result<Self, FeatureError> {
        let numeric = records
            .iter()
            .map(checked_numeric_values)
            .collect::<Result<Vec<_>, _>>()?;

        let scaler = StandardScaler::fit(numeric.as_slice())?;
        let encoder = OneHotEncoder::fit(records.iter().map(|r| r.criterion.as_str()))?;

        Ok(Self { scaler, encoder })
    }

    /// Transforms one record into the classifier's input vector.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric value is not finite.
    pub fn transform(&self, record: &FeatureRecord) -> Result<Vec<f64>, FeatureError> {
        let mut output = self.scaler.transform(&checked_numeric_values(record)?)?;
        output.extend(self.encoder.transform(record.criterion.as_str()));
        Ok(output)
    }

    /// Transforms a batch of records.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`FeatureTransformer::transform`].
    pub fn transform_batch(&self, records: &[FeatureRecord]) -> Result<Vec<Vec<f64>>, FeatureError> {
        records.iter().map(|r| self.transform(r)).collect()
    }

    /// Width of the transformed vector.
    #[must_use]
    pub fn n_output_features(&self) -> usize {
        self.scaler.width() + self.encoder.width()
    }

    /// Names of the transformed columns, prefixed by the transformer that produced them.
    #[must_use]
    pub fn output_feature_names(&self) -> Vec<String> {
        NUMERIC_COLUMNS
            .iter()
            .map(|column| format!("num__{column}"))
            .chain(
                self.encoder
                    .categories()
                    .iter()
                    .map(|category| format!("cat__{CRITERIA_COLUMN}_{category}")),
            )
            .collect()
    }

    /// The fitted numeric scaler.
    #[must_use]
    pub const fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// The fitted criterion encoder.
    #[must_use]
    pub const fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }
}

fn checked_numeric_values(record: &FeatureRecord) -> Result<[f64; 2], FeatureError> {
    let values = numeric_values(record);
    for (column, value) in NUMERIC_COLUMNS.into_iter().zip(values) {
        if !value.is_finite() {
            return Err(FeatureError::NonFinite { column, value });
        }
    }
    Ok(values)
}

//! One-hot encoding of the categorical feature.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::FeatureError;

/// Encodes a categorical value as a one-hot vector.
///
/// Categories are the distinct values seen while fitting, sorted
/// lexicographically. A value outside that vocabulary encodes as all zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    /// Collects the category vocabulary.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` is empty.
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Result<Self, FeatureError> {
        let categories: BTreeSet<&str> = values.into_iter().collect();
        if categories.is_empty() {
            return Err(FeatureError::EmptyInput);
        }

        Ok(Self {
            categories: categories.into_iter().map(str::to_string).collect(),
        })
    }

    /// Encodes one value.
    #[must_use]
    pub fn transform(&self, value: &str) -> Vec<f64> {
        let mut encoded = vec![0.0; self.categories.len()];
        if let Ok(index) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            encoded[index] = 1.0;
        }
        encoded
    }

    /// Whether `value` was seen while fitting.
    #[must_use]
    pub fn is_known(&self, value: &str) -> bool {
        self.categories.binary_search_by(|c| c.as_str().cmp(value)).is_ok()
    }

    /// The fitted vocabulary, in encoding order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Width of the encoded vector.
    #[must_use]
    pub fn width(&self) -> usize {
        self.categories.len()
    }
}

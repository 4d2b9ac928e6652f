//! Standardization of numeric features.

use serde::{Deserialize, Serialize};

use crate::FeatureError;

/// Scales each column to zero mean and unit variance.
///
/// Statistics come from the data passed to [`StandardScaler::fit`] only. The
/// variance is the population variance; a column with no spread is centered
/// but not scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fits column means and standard deviations.
    ///
    /// # Errors
    ///
    /// Returns an error if `rows` is empty or the rows differ in width.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, FeatureError> {
        let first = rows.first().ok_or(FeatureError::EmptyInput)?;
        let width = first.as_ref().len();

        let mut sums = vec![0.0; width];
        for row in rows {
            let row = row.as_ref();
            if row.len() != width {
                return Err(FeatureError::WidthMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += value;
            }
        }

        let n = rows.len() as f64;
        let means: Vec<f64> = sums.into_iter().map(|sum| sum / n).collect();

        let mut squared = vec![0.0; width];
        for row in rows {
            for ((acc, value), mean) in squared.iter_mut().zip(row.as_ref()).zip(&means) {
                let delta = value - mean;
                *acc += delta * delta;
            }
        }

        let scales = squared
            .into_iter()
            .map(|acc| {
                let std = (acc / n).sqrt();
                if std <= f64::EPSILON { 1.0 } else { std }
            })
            .collect();

        Ok(Self { means, scales })
    }

    /// Standardizes a single row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row width differs from the fitted width.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, FeatureError> {
        if row.len() != self.means.len() {
            return Err(FeatureError::WidthMismatch {
                expected: self.means.len(),
                actual: row.len(),
            });
        }

        Ok(row
            .iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((value, mean), scale)| (value - mean) / scale)
            .collect())
    }

    /// Fitted column means.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Fitted column standard deviations (1.0 for constant columns).
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Number of columns the scaler was fitted on.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.means.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_statistics() {
        let scaler = StandardScaler::fit(&[[1.0, 10.0], [3.0, 10.0]]).unwrap();
        assert_eq!(scaler.means(), &[2.0, 10.0]);
        // Population std of [1, 3] is 1; the constant column keeps scale 1.
        assert_eq!(scaler.scales(), &[1.0, 1.0]);
    }

    #[test]
    fn test_transform_zero_mean_unit_variance() {
        let rows = [[2.0], [4.0], [4.0], [4.0], [5.0], [5.0], [7.0], [9.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();

        let scaled: Vec<f64> = rows
            .iter()
            .map(|row| scaler.transform(row).unwrap()[0])
            .collect();
        let mean = scaled.iter().sum::<f64>() / scaled.len() as f64;
        let var = scaled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / scaled.len() as f64;

        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
        assert!((scaler.transform(&[9.0]).unwrap()[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let rows: [[f64; 2]; 0] = [];
        assert!(matches!(StandardScaler::fit(&rows), Err(FeatureError::EmptyInput)));
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = StandardScaler::fit(&[[1.0, 2.0]]).unwrap();
        assert!(scaler.transform(&[1.0]).is_err());
    }
}

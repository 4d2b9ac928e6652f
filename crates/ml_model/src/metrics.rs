//! Evaluation metrics for the binary classifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// 2×2 confusion matrix; rows are true classes, columns predicted classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    /// Tallies `(truth, prediction)` pairs. Classes above 1 are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, u8)>) -> Self {
        let mut counts = [[0; 2]; 2];
        for (truth, predicted) in pairs {
            if let Some(cell) = counts
                .get_mut(usize::from(truth))
                .and_then(|row| row.get_mut(usize::from(predicted)))
            {
                *cell += 1;
            }
        }
        Self { counts }
    }

    /// Count of samples with true class `truth` predicted as `predicted`.
    #[must_use]
    pub fn get(&self, truth: u8, predicted: u8) -> usize {
        self.counts
            .get(usize::from(truth))
            .and_then(|row| row.get(usize::from(predicted)))
            .copied()
            .unwrap_or(0)
    }

    /// Total number of tallied samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Fraction of samples on the diagonal; 0 when empty.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.counts[0][0] + self.counts[1][1]) as f64 / total as f64
    }

    /// Raw counts, indexed `[truth][predicted]`.
    #[must_use]
    pub const fn counts(&self) -> [[usize; 2]; 2] {
        self.counts
    }
}

impl fmt::Display for ConfusionMatrix {
    /// Renders the matrix in the familiar bracketed layout:
    ///
    /// ```text
    /// [[12  3]
    ///  [ 2 13]]
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);

        for (i, row) in self.counts.iter().enumerate() {
            let open = if i == 0 { "[[" } else { " [" };
            let close = if i == self.counts.len() - 1 { "]]" } else { "]\n" };
            write!(f, "{open}{:>width$} {:>width$}{close}", row[0], row[1])?;
        }
        Ok(())
    }
}

/// Fraction of positions where `truth` and `predicted` agree.
///
/// Returns 0 for empty input; extra elements of the longer slice are ignored.
#[must_use]
pub fn accuracy(truth: &[u8], predicted: &[u8]) -> f64 {
    let n = truth.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / n as f64
}

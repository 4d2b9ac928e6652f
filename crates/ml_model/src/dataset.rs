//! Labeled dataset loading and train/evaluation splitting.

use std::path::{Path, PathBuf};

use feature_extractor::{CRITERIA_COLUMN, PERCENTAGE_COLUMN, SALT_COUNT_COLUMN};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, info, warn};
use water_structs::{FeatureRecord, LabeledRecord};

use crate::ModelError;

/// Dataset column holding the binary viability label.
pub const LABEL_COLUMN: &str = "Viability";

/// One CSV row. Columns not named here (`Region`, row ids) are dropped.
#[derive(Debug, Deserialize)]
struct DatasetRow {
    #[serde(rename = "Criteria")]
    criteria: String,

    #[serde(rename = "%percentage", alias = "percentage", alias = "Percentage")]
    percentage: f64,

    #[serde(rename = "Salt_Count")]
    salt_count: f64,

    #[serde(rename = "Viability")]
    viability: u8,
}

/// Returns the first candidate path that exists.
///
/// # Errors
///
/// Returns [`ModelError::DataNotFound`] if none of the candidates exist.
pub fn locate_dataset(candidates: &[PathBuf]) -> Result<PathBuf, ModelError> {
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| ModelError::DataNotFound {
            candidates: candidates.to_vec(),
        })
}

/// Labeled samples used for training and evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaterDataset {
    records: Vec<LabeledRecord>,
}

impl WaterDataset {
    /// Creates a dataset from labeled records.
    #[must_use]
    pub const fn new(records: Vec<LabeledRecord>) -> Self {
        Self { records }
    }

    /// Loads a dataset from a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DataNotFound`] if the file does not exist, and
    /// an error if a row cannot be parsed or carries a label other than 0/1.
    pub fn from_csv(path: &Path) -> Result<Self, ModelError> {
        if !path.is_file() {
            return Err(ModelError::DataNotFound {
                candidates: vec![path.to_path_buf()],
            });
        }

        let csv_error = |source| ModelError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let dropped: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .filter(|header| !is_model_column(header))
            .map(str::to_string)
            .collect();
        if !dropped.is_empty() {
            debug!(?dropped, "Dropping non-feature columns");
        }

        let mut records = Vec::new();
        for (index, result) in reader.deserialize::<DatasetRow>().enumerate() {
            let row = result.map_err(csv_error)?;
            if row.viability > 1 {
                // Line 1 is the header.
                return Err(ModelError::InvalidLabel {
                    row: index + 2,
                    value: row.viability,
                });
            }

            records.push(LabeledRecord {
                features: FeatureRecord::new(row.criteria, row.percentage, row.salt_count),
                viability: row.viability,
            });
        }

        let unexpected = records
            .iter()
            .filter(|r| !r.features.criterion.is_known())
            .count();
        if unexpected > 0 {
            warn!(rows = unexpected, "Rows with a criterion other than Present/Absent");
        }

        info!(path = %path.display(), rows = records.len(), "Loaded dataset");

        Ok(Self { records })
    }

    /// Splits into `(train, test)` subsets.
    ///
    /// The record order is shuffled with a generator seeded by `seed`; the
    /// first `ceil(test_size * n)` shuffled records form the test set.
    ///
    /// # Errors
    ///
    /// Returns an error if `test_size` is outside `(0, 1)` or either subset
    /// would be empty.
    pub fn split(&self, test_size: f64, seed: u64) -> Result<(Self, Self), ModelError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ModelError::InvalidConfig(format!(
                "test size must be in (0, 1), got {test_size}"
            )));
        }

        let n = self.records.len();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_test = (test_size * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(ModelError::InsufficientData(format!(
                "{n} rows cannot be split with test size {test_size}"
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let (test_idx, train_idx) = indices.split_at(n_test);
        let pick = |idx: &[usize]| Self::new(idx.iter().map(|&i| self.records[i].clone()).collect());

        Ok((pick(train_idx), pick(test_idx)))
    }

    /// Feature records in dataset order.
    #[must_use]
    pub fn features(&self) -> Vec<FeatureRecord> {
        self.records.iter().map(|r| r.features.clone()).collect()
    }

    /// Viability labels in dataset order.
    #[must_use]
    pub fn labels(&self) -> Vec<u8> {
        self.records.iter().map(|r| r.viability).collect()
    }

    /// The labeled records.
    #[must_use]
    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn is_model_column(header: &str) -> bool {
    [
        CRITERIA_COLUMN,
        PERCENTAGE_COLUMN,
        "percentage",
        "Percentage",
        SALT_COUNT_COLUMN,
        LABEL_COLUMN,
    ]
    .contains(&header)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    /// Helper to write CSV to a temp file and return the handle.
    fn write_csv(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    fn numbered(n: usize) -> WaterDataset {
        WaterDataset::new(
            (0..n)
                .map(|i| LabeledRecord {
                    features: FeatureRecord::new("Present", i as f64, 1000.0),
                    viability: u8::from(i % 2 == 0),
                })
                .collect(),
        )
    }

    #[test]
    fn test_from_csv_drops_region() {
        let f = write_csv(
            "Region,Criteria,%percentage,Salt_Count,Viability\n\
             15694829,Absent,32,150000,1\n\
             15624510, Present ,19,19000,0\n",
        );

        let dataset = WaterDataset::from_csv(f.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.labels(), vec![1, 0]);
        assert_eq!(
            dataset.records()[1].features,
            FeatureRecord::new("Present", 19.0, 19000.0)
        );
    }

    #[test]
    fn test_from_csv_percentage_alias() {
        let f = write_csv("Criteria,percentage,Salt_Count,Viability\nAbsent,12.5,3000,0\n");
        let dataset = WaterDataset::from_csv(f.path()).unwrap();
        assert!((dataset.records()[0].features.percentage - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_csv_keeps_unexpected_criterion() {
        let f = write_csv("Criteria,%percentage,Salt_Count,Viability\nUnclear,20,21000,0\nAbsent,30,90000,1\n");
        let dataset = WaterDataset::from_csv(f.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.records()[0].features.criterion.is_known());
        assert_eq!(dataset.records()[0].features.criterion.as_str(), "Unclear");
    }

    #[test]
    fn test_from_csv_rejects_bad_label() {
        let f = write_csv("Criteria,%percentage,Salt_Count,Viability\nAbsent,1,2,0\nPresent,3,4,2\n");
        let err = WaterDataset::from_csv(f.path()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidLabel { row: 3, value: 2 }));
    }

    #[test]
    fn test_from_csv_rejects_non_numeric() {
        let f = write_csv("Criteria,%percentage,Salt_Count,Viability\nAbsent,abc,2,0\n");
        assert!(matches!(
            WaterDataset::from_csv(f.path()),
            Err(ModelError::Csv { .. })
        ));
    }

    #[test]
    fn test_from_csv_missing_file() {
        let result = WaterDataset::from_csv(Path::new("/nonexistent/Water_contamination.csv"));
        assert!(matches!(result, Err(ModelError::DataNotFound { .. })));
    }

    #[test]
    fn test_locate_dataset_prefers_first_existing() {
        let f = write_csv("Criteria,%percentage,Salt_Count,Viability\n");
        let missing = PathBuf::from("/nonexistent/Water_contamination.csv");

        let found = locate_dataset(&[missing.clone(), f.path().to_path_buf()]).unwrap();
        assert_eq!(found, f.path());

        let err = locate_dataset(&[missing.clone(), missing]).unwrap_err();
        assert!(matches!(err, ModelError::DataNotFound { ref candidates } if candidates.len() == 2));
    }

    #[test]
    fn test_split_sizes() {
        let dataset = numbered(11);
        let (train, test) = dataset.split(0.2, 42).unwrap();
        // ceil(0.2 * 11) = 3
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_split_is_reproducible_and_disjoint() {
        let dataset = numbered(50);
        let (train_a, test_a) = dataset.split(0.2, 42).unwrap();
        let (train_b, test_b) = dataset.split(0.2, 42).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        let mut seen: Vec<f64> = train_a
            .records()
            .iter()
            .chain(test_a.records())
            .map(|r| r.features.percentage)
            .collect();
        seen.sort_by(f64::total_cmp);
        seen.dedup();
        assert_eq!(seen.len(), 50);
    }

    #[test]
    fn test_split_rejects_degenerate() {
        assert!(numbered(1).split(0.2, 42).is_err());
        assert!(numbered(10).split(1.0, 42).is_err());
        assert!(numbered(10).split(0.0, 42).is_err());
    }
}

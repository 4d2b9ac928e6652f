//! End-to-end fitted pipeline and its on-disk artifact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use feature_extractor::{FEATURE_COLUMNS, FeatureTransformer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use water_structs::{CONTAMINATED_CLASS, FeatureRecord};

use crate::ModelError;
use crate::random_forest::RandomForest;

/// Version of the artifact layout written by [`TrainedPipeline::save`].
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Number of target classes (safe / contaminated).
pub const N_CLASSES: usize = 2;

/// Fitted feature transformer followed by a fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    format_version: u32,
    feature_columns: Vec<String>,
    transformer: FeatureTransformer,
    forest: RandomForest,
}

impl TrainedPipeline {
    /// Combines a fitted transformer and forest.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::FeatureCount`] if the forest was not fitted on
    /// the transformer's output width.
    pub fn new(transformer: FeatureTransformer, forest: RandomForest) -> Result<Self, ModelError> {
        let pipeline = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_columns: FEATURE_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            transformer,
            forest,
        };
        pipeline.check_shape()?;
        Ok(pipeline)
    }

    /// Predicted class (0 or 1) for one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be transformed.
    pub fn predict(&self, record: &FeatureRecord) -> Result<u8, ModelError> {
        let row = self.transformer.transform(record)?;
        let class = self.forest.predict(&row)?;
        Ok(u8::from(class == usize::from(CONTAMINATED_CLASS)))
    }

    /// Class distribution for one record, indexed by class.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be transformed.
    pub fn predict_proba(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        if !self.transformer.encoder().is_known(record.criterion.as_str()) {
            debug!(criterion = %record.criterion, "Criterion not seen in training, encoding as all zeros");
        }
        let row = self.transformer.transform(record)?;
        self.forest.predict_proba(&row)
    }

    /// Probability that `record` is contaminated.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be transformed.
    pub fn contamination_probability(&self, record: &FeatureRecord) -> Result<f64, ModelError> {
        let proba = self.predict_proba(record)?;
        Ok(proba
            .get(usize::from(CONTAMINATED_CLASS))
            .copied()
            .unwrap_or(0.0))
    }

    /// Predicted classes for a batch of records.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`TrainedPipeline::predict`].
    pub fn predict_batch(&self, records: &[FeatureRecord]) -> Result<Vec<u8>, ModelError> {
        records.iter().map(|r| self.predict(r)).collect()
    }

    /// Writes the pipeline as JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ModelError::io(parent, e))?;
        }

        let file = File::create(path).map_err(|e| ModelError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(|e| ModelError::io(path, e))?;

        info!(path = %path.display(), n_trees = self.forest.n_trees(), "Saved pipeline");
        Ok(())
    }

    /// Reads a pipeline written by [`TrainedPipeline::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if its
    /// format version or feature schema does not match this build.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file = File::open(path).map_err(|e| ModelError::io(path, e))?;
        let pipeline: Self = serde_json::from_reader(BufReader::new(file))?;
        pipeline.validate()?;

        info!(
            path = %path.display(),
            n_trees = pipeline.forest.n_trees(),
            categories = ?pipeline.transformer.encoder().categories(),
            "Loaded pipeline"
        );
        Ok(pipeline)
    }

    /// Checks the format version, feature schema and internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] or [`ModelError::FeatureCount`]
    /// on the first problem found.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::SchemaMismatch(format!(
                "format version {} is not supported, expected {ARTIFACT_FORMAT_VERSION}",
                self.format_version
            )));
        }
        if self.feature_columns != FEATURE_COLUMNS {
            return Err(ModelError::SchemaMismatch(format!(
                "feature columns {:?} do not match {FEATURE_COLUMNS:?}",
                self.feature_columns
            )));
        }
        self.forest.validate()?;
        self.check_shape()
    }

    /// Input schema recorded in the artifact.
    #[must_use]
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// The fitted transformer.
    #[must_use]
    pub const fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    /// The fitted forest.
    #[must_use]
    pub const fn forest(&self) -> &RandomForest {
        &self.forest
    }

    fn check_shape(&self) -> Result<(), ModelError> {
        if self.forest.n_classes() != N_CLASSES {
            return Err(ModelError::SchemaMismatch(format!(
                "forest predicts {} classes, expected {N_CLASSES}",
                self.forest.n_classes()
            )));
        }
        let expected = self.transformer.n_output_features();
        if self.forest.n_features() != expected {
            return Err(ModelError::FeatureCount {
                expected,
                actual: self.forest.n_features(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::random_forest::ForestConfig;

    fn records() -> Vec<FeatureRecord> {
        vec![
            FeatureRecord::new("Present", 19.0, 19000.0),
            FeatureRecord::new("Present", 21.0, 21000.0),
            FeatureRecord::new("Present", 18.0, 17000.0),
            FeatureRecord::new("Absent", 60.0, 150_000.0),
            FeatureRecord::new("Absent", 65.0, 160_000.0),
            FeatureRecord::new("Absent", 58.0, 140_000.0),
        ]
    }

    fn fitted() -> TrainedPipeline {
        let records = records();
        let labels = [0, 0, 0, 1, 1, 1];
        let transformer = FeatureTransformer::fit(&records).unwrap();
        let samples = transformer.transform_batch(&records).unwrap();
        let forest = RandomForest::fit(
            &samples,
            &labels,
            N_CLASSES,
            &ForestConfig::default().with_n_trees(15),
        )
        .unwrap();
        TrainedPipeline::new(transformer, forest).unwrap()
    }

    #[test]
    fn test_predict_and_probability_agree() {
        let pipeline = fitted();
        for record in records() {
            let class = pipeline.predict(&record).unwrap();
            let p = pipeline.contamination_probability(&record).unwrap();
            assert_eq!(class == CONTAMINATED_CLASS, p > 0.5, "{record:?} -> {p}");
        }
        assert_eq!(
            pipeline.predict(&FeatureRecord::new("Absent", 62.0, 155_000.0)).unwrap(),
            1
        );
    }

    #[test]
    fn test_unknown_criterion_predicts() {
        let pipeline = fitted();
        let proba = pipeline
            .predict_proba(&FeatureRecord::new("Maybe", 20.0, 20000.0))
            .unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model").join("trained_model.json");
        let pipeline = fitted();
        pipeline.save(&path).unwrap();

        let loaded = TrainedPipeline::load(&path).unwrap();
        assert_eq!(loaded, pipeline);
        assert_eq!(
            loaded.predict_batch(&records()).unwrap(),
            pipeline.predict_batch(&records()).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_wrong_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.json");
        let mut pipeline = fitted();
        pipeline.format_version = ARTIFACT_FORMAT_VERSION + 1;
        fs::write(&path, serde_json::to_vec(&pipeline).unwrap()).unwrap();

        assert!(matches!(
            TrainedPipeline::load(&path),
            Err(ModelError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_load_rejects_wrong_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.json");
        let mut pipeline = fitted();
        pipeline.feature_columns.reverse();
        fs::write(&path, serde_json::to_vec(&pipeline).unwrap()).unwrap();

        assert!(matches!(
            TrainedPipeline::load(&path),
            Err(ModelError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            TrainedPipeline::load(&dir.path().join("absent.json")),
            Err(ModelError::Io { .. })
        ));

        let path = dir.path().join("garbage.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(
            TrainedPipeline::load(&path),
            Err(ModelError::Serialization(_))
        ));
    }

    #[test]
    fn test_new_rejects_width_mismatch() {
        let records = records();
        let transformer = FeatureTransformer::fit(&records).unwrap();
        let forest = RandomForest::fit(
            &[vec![0.0], vec![1.0]],
            &[0, 1],
            N_CLASSES,
            &ForestConfig::default().with_n_trees(2),
        )
        .unwrap();
        assert!(matches!(
            TrainedPipeline::new(transformer, forest),
            Err(ModelError::FeatureCount { expected: 4, actual: 1 })
        ));
    }
}

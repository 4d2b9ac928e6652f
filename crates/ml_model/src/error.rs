//! Error type for dataset handling, training and artifact I/O.

use std::path::{Path, PathBuf};

use feature_extractor::FeatureError;

/// Errors produced by the model crate.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("dataset not found, tried: {}", display_paths(.candidates))]
    DataNotFound { candidates: Vec<PathBuf> },

    #[error("failed to read dataset {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: viability must be 0 or 1, got {value}")]
    InvalidLabel { row: usize, value: u8 },

    #[error("not enough samples: {0}")]
    InsufficientData(String),

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("failed to access artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("incompatible artifact: {0}")]
    SchemaMismatch(String),
}

impl ModelError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

//! ML model crate for water contamination prediction.
//!
//! Loads the labeled dataset, fits a [`FeatureTransformer`] followed by a
//! [`RandomForest`], evaluates the result and persists the fitted
//! [`TrainedPipeline`] as a JSON artifact for the predictor service.
//!
//! [`FeatureTransformer`]: feature_extractor::FeatureTransformer

pub mod dataset;
pub mod decision_tree;
mod error;
pub mod metrics;
pub mod pipeline;
pub mod random_forest;
pub mod training;

pub use dataset::{LABEL_COLUMN, WaterDataset, locate_dataset};
pub use decision_tree::{DecisionTree, TreeNode, TreeParams};
pub use error::ModelError;
pub use metrics::{ConfusionMatrix, accuracy};
pub use pipeline::{ARTIFACT_FORMAT_VERSION, N_CLASSES, TrainedPipeline};
pub use random_forest::{ForestConfig, RandomForest};
pub use training::{Evaluation, TrainingConfig, TrainingOutput, train};

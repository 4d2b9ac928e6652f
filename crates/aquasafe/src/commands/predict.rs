//! Predict command - classifies a single sample against a saved pipeline.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use water_structs::{FeatureRecord, PredictionResult};

use crate::classifier::{PipelineModel, RiskClassifier};

/// Runs the predict command.
///
/// # Errors
///
/// Returns an error if the pipeline cannot be loaded or the sample is rejected.
pub fn run(model_path: &Path, record: &FeatureRecord) -> Result<PredictionResult> {
    let model = PipelineModel::load(model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
    let classifier = RiskClassifier::new(Arc::new(model));

    let result = classifier.classify(record)?;

    info!(
        criteria = %record.criterion,
        percentage = record.percentage,
        salt_count = record.salt_count,
        prediction = %result.label,
        risk_level = %result.risk_level,
        "Prediction"
    );

    Ok(result)
}

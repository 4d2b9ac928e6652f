//! Train command - fits the pipeline on the labeled dataset and saves it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::Config;
use ml_model::{Evaluation, TrainingConfig, WaterDataset, locate_dataset, train};
use tracing::info;

/// Runs the train command.
///
/// # Arguments
///
/// * `config` - Runtime configuration providing default paths
/// * `data_path` - Dataset override; the configured candidates are searched otherwise
/// * `output_path` - Artifact override; defaults to the configured model path
/// * `training` - Split and forest parameters
///
/// # Errors
///
/// Returns an error if the dataset cannot be found or read, training fails,
/// or the artifact cannot be written.
pub fn run(
    config: &Config,
    data_path: Option<&Path>,
    output_path: Option<&Path>,
    training: &TrainingConfig,
) -> Result<Evaluation> {
    let candidates = data_path.map_or_else(|| config.dataset_candidates(), |p| vec![p.to_path_buf()]);
    let dataset_path = locate_dataset(&candidates)?;
    let output_path: PathBuf = output_path.map_or_else(|| config.model_path.clone(), Path::to_path_buf);

    info!(
        dataset = %dataset_path.display(),
        output = %output_path.display(),
        n_trees = training.forest.n_trees,
        seed = training.seed,
        test_size = training.test_size,
        "Starting training"
    );

    let dataset = WaterDataset::from_csv(&dataset_path)?;
    let output = train(&dataset, training).context("Training failed")?;

    output
        .pipeline
        .save(&output_path)
        .with_context(|| format!("Failed to save pipeline to {}", output_path.display()))?;

    info!(
        accuracy = output.evaluation.accuracy,
        n_train = output.evaluation.n_train,
        n_test = output.evaluation.n_test,
        output = %output_path.display(),
        "Training complete"
    );

    Ok(output.evaluation)
}

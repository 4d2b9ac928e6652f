//! Training routine: split, fit, evaluate.

use feature_extractor::FeatureTransformer;
use tracing::info;

use crate::ModelError;
use crate::dataset::WaterDataset;
use crate::metrics::{self, ConfusionMatrix};
use crate::pipeline::{N_CLASSES, TrainedPipeline};
use crate::random_forest::{ForestConfig, RandomForest};

/// Configuration for a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    /// Fraction of records held out for evaluation.
    pub test_size: f64,
    /// Seed for the train/test shuffle.
    pub seed: u64,
    /// Forest hyperparameters.
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            forest: ForestConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Sets the held-out fraction.
    #[must_use]
    pub const fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Sets both the split seed and the forest seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.forest = self.forest.with_seed(seed);
        self
    }

    /// Sets the number of trees.
    #[must_use]
    pub const fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.forest.n_trees = n_trees;
        self
    }
}

/// Held-out evaluation of a trained pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Fraction of correctly classified held-out records.
    pub accuracy: f64,
    /// Confusion matrix over the held-out records.
    pub confusion: ConfusionMatrix,
    /// Number of training records.
    pub n_train: usize,
    /// Number of held-out records.
    pub n_test: usize,
}

/// Output from training.
#[derive(Debug, Clone)]
pub struct TrainingOutput {
    /// The fitted pipeline.
    pub pipeline: TrainedPipeline,
    /// Its evaluation on the held-out records.
    pub evaluation: Evaluation,
}

/// Fits the transformer and forest on a training split and evaluates on the rest.
///
/// # Errors
///
/// Returns an error if the dataset is too small to split, the configuration
/// is invalid, or fitting fails.
pub fn train(dataset: &WaterDataset, config: &TrainingConfig) -> Result<TrainingOutput, ModelError> {
    if dataset.is_empty() {
        return Err(ModelError::InsufficientData("no training data provided".into()));
    }

    let (train_set, test_set) = dataset.split(config.test_size, config.seed)?;
    info!(
        train = train_set.len(),
        test = test_set.len(),
        "Split dataset"
    );

    let train_features = train_set.features();
    let transformer = FeatureTransformer::fit(&train_features)?;
    let samples = transformer.transform_batch(&train_features)?;
    let labels: Vec<usize> = train_set.labels().into_iter().map(usize::from).collect();

    info!(
        n_trees = config.forest.n_trees,
        seed = config.forest.seed,
        columns = ?transformer.output_feature_names(),
        "Fitting random forest"
    );
    let forest = RandomForest::fit(&samples, &labels, N_CLASSES, &config.forest)?;
    let pipeline = TrainedPipeline::new(transformer, forest)?;

    let truth = test_set.labels();
    let predicted = pipeline.predict_batch(&test_set.features())?;
    let confusion = ConfusionMatrix::from_pairs(truth.iter().copied().zip(predicted.iter().copied()));
    let evaluation = Evaluation {
        accuracy: metrics::accuracy(&truth, &predicted),
        confusion,
        n_train: train_set.len(),
        n_test: test_set.len(),
    };

    info!(accuracy = evaluation.accuracy, "Evaluation complete");
    info!("Confusion matrix:\n{}", evaluation.confusion);

    Ok(TrainingOutput {
        pipeline,
        evaluation,
    })
}

//! Random forest classifier.
//!
//! Ensemble of [`DecisionTree`]s, each grown on a bootstrap sample of the
//! training set. Class probabilities are the mean of the per-tree leaf
//! distributions; the predicted class is their argmax.
//!
//! Every tree draws from its own generator seeded from the forest seed, so a
//! given `(data, config)` pair always yields the same forest.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ModelError;
use crate::decision_tree::{DecisionTree, TreeParams, argmax};

/// Hyperparameters of the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestConfig {
    /// Number of trees.
    pub n_trees: usize,
    /// Seed for bootstrap sampling and feature selection.
    pub seed: u64,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum number of samples required to split a node.
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl ForestConfig {
    /// Sets the number of trees.
    #[must_use]
    pub const fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// A random forest classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    /// Fits a forest on `samples` with class `labels` in `0..n_classes`.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no samples, no trees are requested, or
    /// a tree cannot be grown.
    pub fn fit(
        samples: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        config: &ForestConfig,
    ) -> Result<Self, ModelError> {
        if config.n_trees == 0 {
            return Err(ModelError::InvalidConfig("forest needs at least one tree".into()));
        }
        if config.min_samples_split < 2 {
            return Err(ModelError::InvalidConfig(
                "min_samples_split must be at least 2".into(),
            ));
        }
        let Some(first) = samples.first() else {
            return Err(ModelError::InsufficientData("no training samples".into()));
        };

        let n = samples.len();
        let n_features = first.len();
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            ..TreeParams::for_features(n_features)
        };

        let mut seeds = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);
        let mut bootstrap = vec![0; n];

        for _ in 0..config.n_trees {
            let mut rng = StdRng::seed_from_u64(seeds.r#gen::<u64>());
            for slot in &mut bootstrap {
                *slot = rng.gen_range(0..n);
            }
            trees.push(DecisionTree::fit(
                samples, labels, &bootstrap, n_classes, params, &mut rng,
            )?);
        }

        let forest = Self {
            trees,
            n_features,
            n_classes,
        };
        debug!(
            n_trees = forest.n_trees(),
            avg_depth = forest.avg_depth(),
            total_nodes = forest.total_nodes(),
            "Fitted random forest"
        );

        Ok(forest)
    }

    /// Build a forest from a collection of trained trees.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the forest is empty or trees disagree on shape.
    pub fn from_trees(trees: Vec<DecisionTree>) -> Result<Self, ModelError> {
        let Some(first) = trees.first() else {
            return Err(ModelError::SchemaMismatch("empty forest".into()));
        };
        let forest = Self {
            n_features: first.n_features(),
            n_classes: first.n_classes(),
            trees,
        };
        forest.validate()?;
        Ok(forest)
    }

    /// Checks every tree and that all trees share one shape.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] on the first inconsistency.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::SchemaMismatch("empty forest".into()));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features || tree.n_classes() != self.n_classes {
                return Err(ModelError::SchemaMismatch(format!(
                    "tree {index} expects {} features and {} classes, forest expects {} and {}",
                    tree.n_features(),
                    tree.n_classes(),
                    self.n_features,
                    self.n_classes
                )));
            }
            tree.validate()?;
        }
        Ok(())
    }

    /// Mean class distribution across trees.
    ///
    /// # Errors
    ///
    /// Returns an error if `features` does not have `n_features` values.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.check_width(features)?;

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(features)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }

    /// Predicted class; ties resolve to the lower class.
    ///
    /// # Errors
    ///
    /// Returns an error if `features` does not have `n_features` values.
    pub fn predict(&self, features: &[f64]) -> Result<usize, ModelError> {
        Ok(argmax(&self.predict_proba(features)?))
    }

    /// Number of trees in the forest.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Expected number of features per sample.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of output classes.
    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Average tree depth across the forest.
    #[must_use]
    pub fn avg_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }

    /// Total number of nodes across all trees.
    #[must_use]
    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }

    fn check_width(&self, features: &[f64]) -> Result<(), ModelError> {
        if features.len() == self.n_features {
            Ok(())
        } else {
            Err(ModelError::FeatureCount {
                expected: self.n_features,
                actual: features.len(),
            })
        }
    }
}

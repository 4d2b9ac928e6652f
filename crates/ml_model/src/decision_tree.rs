//! CART decision tree classifier.
//!
//! Nodes are stored in a flat array; a split sends samples with
//! `x[feature] <= threshold` to the left child. Leaves hold the class
//! distribution of the training samples that reached them, which is what
//! [`DecisionTree::predict_proba`] returns.
//!
//! Growth follows the usual random forest setup: Gini impurity, no depth
//! limit by default, and a random subset of features examined at each node.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Non-constant features examined per split.
    pub max_features: usize,
    /// Maximum depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum number of samples required to split a node.
    pub min_samples_split: usize,
}

impl TreeParams {
    /// Default parameters for a forest over `n_features` columns.
    #[must_use]
    pub fn for_features(n_features: usize) -> Self {
        Self {
            max_features: default_max_features(n_features),
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

/// `floor(sqrt(n))`, at least 1.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn default_max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

/// A node in the decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Fraction of training samples per class.
        distribution: Vec<f64>,
    },
}

impl TreeNode {
    /// Returns `true` if this node is a leaf.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }
}

/// A decision tree classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    n_classes: usize,
}

/// Borrowed training data shared by all nodes while growing.
struct GrowContext<'a, R: ?Sized> {
    samples: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    params: TreeParams,
    rng: &'a mut R,
}

/// Best split found at a node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grows a tree on the samples selected by `indices`.
    ///
    /// `indices` may repeat entries (bootstrap samples).
    ///
    /// # Errors
    ///
    /// Returns an error if `indices` is empty, samples differ in width, or a
    /// label is not below `n_classes`.
    pub fn fit<R: Rng + ?Sized>(
        samples: &[Vec<f64>],
        labels: &[usize],
        indices: &[usize],
        n_classes: usize,
        params: TreeParams,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        if indices.is_empty() {
            return Err(ModelError::InsufficientData(
                "cannot grow a tree without samples".into(),
            ));
        }
        if samples.len() != labels.len() {
            return Err(ModelError::InsufficientData(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }

        if let Some(&bad) = indices.iter().find(|&&i| i >= samples.len()) {
            return Err(ModelError::InsufficientData(format!(
                "sample index {bad} is out of range for {} samples",
                samples.len()
            )));
        }

        let n_features = samples[indices[0]].len();
        if let Some(bad) = samples.iter().find(|s| s.len() != n_features) {
            return Err(ModelError::FeatureCount {
                expected: n_features,
                actual: bad.len(),
            });
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(ModelError::InvalidConfig(format!(
                "label {label} is out of range for {n_classes} classes"
            )));
        }

        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
            n_classes,
        };
        let mut ctx = GrowContext {
            samples,
            labels,
            n_classes,
            params,
            rng,
        };
        let mut working = indices.to_vec();
        tree.grow(&mut ctx, &mut working);

        Ok(tree)
    }

    /// Builds a tree from explicit nodes, checking the structure.
    ///
    /// # Errors
    ///
    /// Returns an error if the nodes do not form a valid tree.
    pub fn from_nodes(
        nodes: Vec<TreeNode>,
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self, ModelError> {
        let tree = Self {
            nodes,
            n_features,
            n_classes,
        };
        tree.validate()?;
        Ok(tree)
    }

    /// Checks that child links point forward, features are in range and
    /// leaf distributions have one entry per class.
    ///
    /// Forward links guarantee traversal terminates.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] describing the first defect.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::SchemaMismatch("tree has no nodes".into()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= self.n_features {
                        return Err(ModelError::SchemaMismatch(format!(
                            "node {index} splits on feature {feature} of {}",
                            self.n_features
                        )));
                    }
                    for child in [left, right] {
                        if *child <= index || *child >= self.nodes.len() {
                            return Err(ModelError::SchemaMismatch(format!(
                                "node {index} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { distribution } => {
                    if distribution.len() != self.n_classes {
                        return Err(ModelError::SchemaMismatch(format!(
                            "leaf {index} has {} classes, expected {}",
                            distribution.len(),
                            self.n_classes
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Class distribution of the leaf reached by `features`.
    ///
    /// The caller is responsible for passing `n_features` values.
    #[must_use]
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Most probable class for `features`; ties resolve to the lower class.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(self.predict_proba(features))
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Expected number of features.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of classes.
    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Tree depth (longest root-to-leaf path).
    #[must_use]
    pub fn depth(&self) -> usize {
        // Children always follow their parent, so one forward pass suffices.
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max_depth = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            max_depth = max_depth.max(depths[index]);
            if let TreeNode::Split { left, right, .. } = node {
                depths[*left] = depths[index] + 1;
                depths[*right] = depths[index] + 1;
            }
        }
        max_depth
    }

    /// Grows the tree over `indices` from an empty node list.
    ///
    /// Pending nodes are kept on an explicit stack, so tree depth is bounded
    /// by memory rather than by the thread's call stack.
    fn grow<R: Rng + ?Sized>(&mut self, ctx: &mut GrowContext<'_, R>, indices: &mut [usize]) {
        self.nodes.push(placeholder());
        let mut pending = vec![GrowTask {
            node: 0,
            start: 0,
            end: indices.len(),
            depth: 0,
        }];

        // Left subtrees are popped first, so random draws follow depth-first order.
        while let Some(task) = pending.pop() {
            let slice = &mut indices[task.start..task.end];
            let counts = class_counts(ctx.labels, slice, ctx.n_classes);

            let depth_reached = ctx.params.max_depth.is_some_and(|max| task.depth >= max);
            let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

            let split = if depth_reached || pure || slice.len() < ctx.params.min_samples_split {
                None
            } else {
                best_split(ctx, slice, &counts)
            };

            let Some(split) = split else {
                self.nodes[task.node] = leaf(&counts, slice.len());
                continue;
            };

            let boundary = partition(slice, |i| {
                ctx.samples[i][split.feature] <= split.threshold
            });

            // Children are pushed after their parent.
            let left = self.nodes.len();
            let right = left + 1;
            self.nodes.push(placeholder());
            self.nodes.push(placeholder());
            self.nodes[task.node] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            let middle = task.start + boundary;
            pending.push(GrowTask {
                node: right,
                start: middle,
                end: task.end,
                depth: task.depth + 1,
            });
            pending.push(GrowTask {
                node: left,
                start: task.start,
                end: middle,
                depth: task.depth + 1,
            });
        }
    }
}

/// A reserved node still waiting to be grown from `indices[start..end]`.
struct GrowTask {
    node: usize,
    start: usize,
    end: usize,
    depth: usize,
}

const fn placeholder() -> TreeNode {
    TreeNode::Leaf {
        distribution: Vec::new(),
    }
}

/// Index of the largest value; the first one wins ties.
#[must_use]
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = index;
        }
    }
    best
}

fn class_counts(labels: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &i in indices {
        counts[labels[i]] += 1;
    }
    counts
}

fn leaf(counts: &[usize], n: usize) -> TreeNode {
    let total = n.max(1) as f64;
    TreeNode::Leaf {
        distribution: counts.iter().map(|&c| c as f64 / total).collect(),
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let total = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Searches random features for the split with the lowest weighted Gini impurity.
///
/// Features are visited in random order until `max_features` non-constant
/// ones have been examined. Returns `None` if every feature is constant.
fn best_split<R: Rng + ?Sized>(
    ctx: &mut GrowContext<'_, R>,
    indices: &[usize],
    counts: &[usize],
) -> Option<SplitCandidate> {
    let n = indices.len();
    let n_features = ctx.samples[indices[0]].len();

    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(&mut *ctx.rng);

    let mut best: Option<SplitCandidate> = None;
    let mut examined = 0;
    let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);

    for feature in features {
        if examined >= ctx.params.max_features {
            break;
        }

        column.clear();
        column.extend(indices.iter().map(|&i| (ctx.samples[i][feature], ctx.labels[i])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (Some(first), Some(last)) = (column.first(), column.last()) else {
            continue;
        };
        if first.0 >= last.0 {
            continue;
        }
        examined += 1;

        let mut left = vec![0; ctx.n_classes];
        let mut right = counts.to_vec();

        for k in 0..n - 1 {
            let (value, label) = column[k];
            left[label] += 1;
            right[label] -= 1;

            let next = column[k + 1].0;
            if value >= next {
                continue;
            }

            let n_left = k + 1;
            let n_right = n - n_left;
            let impurity =
                (n_left as f64).mul_add(gini(&left, n_left), n_right as f64 * gini(&right, n_right))
                    / n as f64;

            if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                let mut threshold = value / 2.0 + next / 2.0;
                if threshold >= next || !threshold.is_finite() {
                    threshold = value;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }

    best
}

/// Reorders `indices` so entries satisfying `goes_left` come first.
///
/// Returns the number of such entries.
fn partition(indices: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut boundary = 0;
    for j in 0..indices.len() {
        if goes_left(indices[j]) {
            indices.swap(boundary, j);
            boundary += 1;
        }
    }
    boundary
}

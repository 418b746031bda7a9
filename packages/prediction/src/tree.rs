//! Decision-tree ensembles.
//!
//! Trees are stored as flat node arrays. A split sends a row left when
//! `row[feature] <= threshold`, the same convention scikit-learn uses, so
//! exported forests and gradient-boosted ensembles score identically.

use serde::Deserialize;

use crate::{PredictionError, regressor::Regressor};

/// How per-tree outputs are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Average of the trees (random forests).
    #[default]
    Mean,
    /// Sum of the trees (boosting, learning rate folded into the leaves).
    Sum,
}

/// One tree node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal node.
    Split {
        /// Index into the ensemble's feature names.
        feature: usize,
        /// Rows with `value <= threshold` go left.
        threshold: f64,
        /// Index of the left child.
        left: usize,
        /// Index of the right child.
        right: usize,
    },
    /// Terminal node.
    Leaf {
        /// Predicted raw score.
        value: f64,
    },
}

/// A single tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Wraps a flat node array. The nodes are checked when the tree joins a
    /// [`TreeEnsemble`].
    #[must_use]
    pub const fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// Checks that every node index is in range and every child comes after
    /// its parent, which guarantees [`Self::evaluate`] terminates.
    fn validate(&self, feature_count: usize) -> Result<(), PredictionError> {
        if self.nodes.is_empty() {
            return Err(PredictionError::InvalidModel("tree has no nodes".to_string()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= feature_count {
                        return Err(PredictionError::InvalidModel(format!(
                            "node {index} splits on feature {feature} of {feature_count}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(PredictionError::InvalidModel(format!(
                            "node {index} has a non-finite threshold"
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(PredictionError::InvalidModel(format!(
                                "node {index} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(PredictionError::InvalidModel(format!(
                            "leaf {index} has a non-finite value"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Walks the tree for one row. Only called on validated trees.
    fn evaluate(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Serialized form of a [`TreeEnsemble`], checked on conversion.
#[derive(Debug, Deserialize)]
struct TreeEnsembleFile {
    feature_names: Vec<String>,
    #[serde(default)]
    aggregation: Aggregation,
    #[serde(default)]
    base_score: f64,
    trees: Vec<DecisionTree>,
}

/// A tree ensemble over named columns.
///
/// Only constructible through [`Self::new`] or deserialization, both of
/// which validate every tree, so scoring always terminates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "TreeEnsembleFile")]
pub struct TreeEnsemble {
    feature_names: Vec<String>,
    aggregation: Aggregation,
    base_score: f64,
    trees: Vec<DecisionTree>,
}

impl TryFrom<TreeEnsembleFile> for TreeEnsemble {
    type Error = PredictionError;

    fn try_from(file: TreeEnsembleFile) -> Result<Self, Self::Error> {
        Self::new(
            file.feature_names,
            file.aggregation,
            file.base_score,
            file.trees,
        )
    }
}

impl TreeEnsemble {
    /// Builds an ensemble. Split `feature` indices point into
    /// `feature_names`; `base_score` is added to the combined tree output.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::InvalidModel`] if the ensemble is empty,
    /// the base score is not finite, or a tree is malformed.
    pub fn new(
        feature_names: Vec<String>,
        aggregation: Aggregation,
        base_score: f64,
        trees: Vec<DecisionTree>,
    ) -> Result<Self, PredictionError> {
        if trees.is_empty() {
            return Err(PredictionError::InvalidModel("ensemble has no trees".to_string()));
        }
        if !base_score.is_finite() {
            return Err(PredictionError::InvalidModel(
                "ensemble has a non-finite base score".to_string(),
            ));
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(feature_names.len()).map_err(|e| match e {
                PredictionError::InvalidModel(message) => {
                    PredictionError::InvalidModel(format!("tree {i}: {message}"))
                }
                other => other,
            })?;
        }

        Ok(Self {
            feature_names,
            aggregation,
            base_score,
            trees,
        })
    }
}

impl Regressor for TreeEnsemble {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict_row(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.evaluate(row)).sum();
        let combined = match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => total,
        };
        self.base_score + combined
    }
}

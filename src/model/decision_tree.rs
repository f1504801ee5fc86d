//! Regression tree with variance-reduction splits

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::Model;
use crate::error::{MartcastError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// CART-style regression tree. Splits minimize weighted child variance;
/// leaves predict the subset mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    n_features: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }

    fn build(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], depth: usize) -> TreeNode {
        let n = indices.len();
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n as f64;

        let at_max_depth = self.max_depth.is_some_and(|d| depth >= d);
        if n < self.min_samples_split || at_max_depth || is_constant(y, indices) {
            return TreeNode::Leaf { value: mean };
        }

        let Some((feature, threshold)) = self.best_split(x, y, indices) else {
            return TreeNode::Leaf { value: mean };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature]] <= threshold);
        if left_indices.len() < self.min_samples_leaf
            || right_indices.len() < self.min_samples_leaf
        {
            return TreeNode::Leaf { value: mean };
        }

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(self.build(x, y, &left_indices, depth + 1)),
            right: Box::new(self.build(x, y, &right_indices, depth + 1)),
        }
    }

    /// Best (feature, threshold) by variance reduction. Each feature sweeps
    /// its sorted values once with running sums; features scan in parallel.
    fn best_split(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_impurity = total_sq / n - (total_sum / n).powi(2);

        (0..self.n_features)
            .into_par_iter()
            .filter_map(|feature| {
                let mut order = indices.to_vec();
                order.sort_by(|&a, &b| {
                    x[[a, feature]]
                        .partial_cmp(&x[[b, feature]])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                let mut left_sum = 0.0;
                let mut left_sq = 0.0;
                let mut best: Option<(f64, f64)> = None; // (gain, threshold)

                for (left_count, pair) in order.windows(2).enumerate() {
                    let yi = y[pair[0]];
                    left_sum += yi;
                    left_sq += yi * yi;
                    let left_count = left_count + 1;
                    let right_count = order.len() - left_count;

                    let lo = x[[pair[0], feature]];
                    let hi = x[[pair[1], feature]];
                    if lo == hi {
                        continue;
                    }
                    if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let right_sq = total_sq - left_sq;
                    let left_var = left_sq / left_count as f64 - (left_sum / left_count as f64).powi(2);
                    let right_var =
                        right_sq / right_count as f64 - (right_sum / right_count as f64).powi(2);
                    let weighted =
                        (left_count as f64 * left_var + right_count as f64 * right_var) / n;

                    let gain = parent_impurity - weighted;
                    if gain > best.map_or(1e-12, |(g, _)| g) {
                        best = Some((gain, (lo + hi) / 2.0));
                    }
                }

                best.map(|(gain, threshold)| (feature, threshold, gain))
            })
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(feature, threshold, _)| (feature, threshold))
    }

    fn predict_row(&self, node: &TreeNode, row: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    self.predict_row(left, row)
                } else {
                    self.predict_row(right, row)
                }
            }
        }
    }
}

impl Model for DecisionTreeRegressor {
    fn name(&self) -> &'static str {
        "decision_tree"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(MartcastError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(MartcastError::ValidationError(
                "cannot fit on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build(x, y, &indices, 0));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(MartcastError::ModelNotFitted)?;
        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| self.predict_row(root, &x.row(i).to_vec()))
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}

fn is_constant(y: &Array1<f64>, indices: &[usize]) -> bool {
    let first = y[indices[0]];
    indices.iter().all(|&i| (y[i] - first).abs() < 1e-12)
}

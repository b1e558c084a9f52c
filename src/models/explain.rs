//! Per-row feature attribution for tree ensembles (path-dependent TreeSHAP)
//!
//! Attributions are exact Shapley values of the tree's conditional
//! expectation, where missing features follow the training cover of each
//! branch. For every row `base_value + sum(values[row]) == prediction(row)`.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use super::tree::RegressionTree;
use super::TreeEnsemble;
use crate::error::TrainingError;
use crate::pipeline::FeatureMatrix;

/// Attribution scores for every (row, feature) pair
#[derive(Debug, Clone, Serialize)]
pub struct Attribution {
    pub feature_names: Vec<String>,
    /// Expected model output over the training cover
    pub base_value: f64,
    /// One row per explained row, one column per feature
    pub values: Vec<Vec<f64>>,
}

/// Mean absolute attribution of one feature
#[derive(Debug, Clone, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub mean_abs: f64,
}

impl Attribution {
    /// Features ranked by mean absolute attribution, largest first
    pub fn global_ranking(&self) -> Vec<FeatureImportance> {
        let n = self.values.len().max(1) as f64;
        let mut ranking: Vec<FeatureImportance> = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| FeatureImportance {
                feature: name.clone(),
                mean_abs: self.values.iter().map(|row| row[j].abs()).sum::<f64>() / n,
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.mean_abs
                .total_cmp(&a.mean_abs)
                .then_with(|| a.feature.cmp(&b.feature))
        });
        ranking
    }

    /// Model output reconstructed from the attributions of one row
    pub fn reconstructed(&self, row: usize) -> f64 {
        self.base_value + self.values[row].iter().sum::<f64>()
    }
}

/// Attribute every row of `x` for the given ensemble.
pub fn explain(ensemble: &dyn TreeEnsemble, x: &FeatureMatrix) -> Result<Attribution, TrainingError> {
    let n_features = ensemble.n_features();
    if x.n_features() != n_features {
        return Err(TrainingError::FeatureMismatch {
            model: "explainer".to_string(),
            expected: n_features,
            got: x.n_features(),
        });
    }

    let trees = ensemble.weighted_trees();
    let base_value = ensemble.offset()
        + trees
            .iter()
            .map(|(tree, weight)| weight * tree.expected_value())
            .sum::<f64>();

    let values: Vec<Vec<f64>> = x
        .rows
        .par_iter()
        .map(|row| {
            let mut phi = vec![0.0; n_features];
            for (tree, weight) in &trees {
                tree_shap(tree, row, *weight, &mut phi);
            }
            phi
        })
        .collect();

    info!(
        "Computed attributions for {} rows over {} trees",
        values.len(),
        trees.len()
    );
    Ok(Attribution {
        feature_names: x.names.clone(),
        base_value,
        values,
    })
}

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

/// Branch of the tree still to be visited, with the path that reached it
struct Frame {
    at: usize,
    path: Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
}

/// Walks the tree from an explicit stack; depth is bounded by the node count,
/// not by the rayon worker's stack.
fn tree_shap(tree: &RegressionTree, row: &[f64], scale: f64, phi: &mut [f64]) {
    let nodes = tree.nodes();
    if nodes.is_empty() {
        return;
    }
    let mut pending = vec![Frame {
        at: 0,
        path: Vec::new(),
        zero_fraction: 1.0,
        one_fraction: 1.0,
        feature: None,
    }];

    while let Some(frame) = pending.pop() {
        let mut path = frame.path;
        extend_path(&mut path, frame.zero_fraction, frame.one_fraction, frame.feature);
        let node = &nodes[frame.at];

        let Some(split) = node.feature else {
            for i in 1..path.len() {
                let element = path[i];
                if let Some(f) = element.feature {
                    let w = unwound_sum(&path, i);
                    phi[f] += w * (element.one_fraction - element.zero_fraction) * node.value * scale;
                }
            }
            continue;
        };

        let (hot, cold) = if row[split] <= node.threshold {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        let cover = node.n_samples as f64;
        let hot_zero = nodes[hot].n_samples as f64 / cover;
        let cold_zero = nodes[cold].n_samples as f64 / cover;

        // A feature already on the path is folded back out before re-entering
        let mut incoming_zero = 1.0;
        let mut incoming_one = 1.0;
        if let Some(k) = path.iter().position(|e| e.feature == Some(split)) {
            incoming_zero = path[k].zero_fraction;
            incoming_one = path[k].one_fraction;
            unwind_path(&mut path, k);
        }

        pending.push(Frame {
            at: cold,
            path: path.clone(),
            zero_fraction: cold_zero * incoming_zero,
            one_fraction: 0.0,
            feature: Some(split),
        });
        pending.push(Frame {
            at: hot,
            path,
            zero_fraction: hot_zero * incoming_zero,
            one_fraction: incoming_one,
            feature: Some(split),
        });
    }
}

fn extend_path(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next = path[depth].weight;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let previous = path[i].weight;
            path[i].weight = next * denom / ((i + 1) as f64 * one);
            next = previous - path[i].weight * zero * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero * (depth - i) as f64);
        }
    }
    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total path weight with element `index` unwound, without modifying the path
fn unwound_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let w = next * denom / ((i + 1) as f64 * one);
            total += w;
            next = path[i].weight - w * zero * (depth - i) as f64 / denom;
        } else if zero != 0.0 {
            total += path[i].weight / zero / ((depth - i) as f64 / denom);
        }
    }
    total
}

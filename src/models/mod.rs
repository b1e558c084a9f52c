//! Regression models, metrics and tree attribution
//!
//! Every model implements [`Regressor`]. Tree ensembles additionally expose
//! their trees through [`TreeEnsemble`] so the explainer can walk them.

pub mod boosting;
pub mod explain;
pub mod forest;
pub mod linear;
pub mod metrics;
pub mod trainer;
pub mod tree;

pub use boosting::{BoostingConfig, GradientBoosting};
pub use explain::{explain, Attribution, FeatureImportance};
pub use forest::{ForestConfig, RandomForest};
pub use linear::LinearRegression;
pub use metrics::RegressionMetrics;
pub use trainer::{best_tree_model, train_and_evaluate, ModelOutcome, ModelingConfig, TrainedModel};
pub use tree::{Node, RegressionTree, TreeConfig};

use crate::error::TrainingError;
use crate::pipeline::FeatureMatrix;

/// A model that learns `y ~ f(x)` from a feature matrix
pub trait Regressor: Send + Sync {
    fn name(&self) -> &str;

    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<(), TrainingError>;

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, TrainingError>;

    /// Tree view of the model, for models built from regression trees
    fn as_tree_ensemble(&self) -> Option<&dyn TreeEnsemble> {
        None
    }
}

/// Additive ensemble: `prediction = offset + sum(weight * tree(x))`
pub trait TreeEnsemble: Send + Sync {
    fn offset(&self) -> f64;

    fn weighted_trees(&self) -> Vec<(&RegressionTree, f64)>;

    fn n_features(&self) -> usize;
}

/// Shape and finiteness checks shared by every `fit`.
pub(crate) fn validate_training(model: &str, x: &FeatureMatrix, y: &[f64]) -> Result<(), TrainingError> {
    if x.n_rows() == 0 {
        return Err(TrainingError::EmptyTrainingSet {
            model: model.to_string(),
        });
    }
    if x.n_rows() != y.len() {
        return Err(TrainingError::LengthMismatch {
            model: model.to_string(),
            rows: x.n_rows(),
            targets: y.len(),
        });
    }
    if let Some(row) = x.rows.iter().find(|row| row.len() != x.n_features()) {
        return Err(TrainingError::FeatureMismatch {
            model: model.to_string(),
            expected: x.n_features(),
            got: row.len(),
        });
    }
    let finite = y.iter().all(|v| v.is_finite())
        && x.rows.iter().all(|row| row.iter().all(|v| v.is_finite()));
    if !finite {
        return Err(TrainingError::NonFinite {
            model: model.to_string(),
        });
    }
    Ok(())
}

/// Column-count check shared by every `predict`.
pub(crate) fn validate_prediction(model: &str, x: &FeatureMatrix, expected: usize) -> Result<(), TrainingError> {
    let got = x
        .rows
        .iter()
        .map(|row| row.len())
        .find(|&len| len != expected)
        .unwrap_or(x.n_features());
    if got != expected {
        return Err(TrainingError::FeatureMismatch {
            model: model.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

/// Predict every row through an ensemble.
pub(crate) fn ensemble_predict(ensemble: &dyn TreeEnsemble, x: &FeatureMatrix) -> Vec<f64> {
    let trees = ensemble.weighted_trees();
    x.rows
        .iter()
        .map(|row| {
            ensemble.offset()
                + trees
                    .iter()
                    .map(|(tree, weight)| weight * tree.predict_row(row))
                    .sum::<f64>()
        })
        .collect()
}

//! Gradient-boosted regression trees on squared error
//!
//! Each round fits a tree to the current residuals (the negative gradient of
//! squared error; the hessian is 1 per row, so leaf weights reduce to
//! `sum(residual) / (count + lambda)`). Trees are added scaled by the
//! learning rate on top of a constant base score.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::tree::{RegressionTree, TreeConfig};
use super::{ensemble_predict, validate_prediction, validate_training, Regressor, TreeEnsemble};
use crate::error::TrainingError;
use crate::pipeline::FeatureMatrix;

const NAME: &str = "Gradient Boosting";

#[derive(Debug, Clone)]
pub struct BoostingConfig {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub tree: TreeConfig,
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.3,
            tree: TreeConfig {
                max_depth: Some(6),
                lambda: 1.0,
                ..TreeConfig::default()
            },
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GradientBoosting {
    config: BoostingConfig,
    base_score: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
    fitted: bool,
}

impl GradientBoosting {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            base_score: 0.0,
            trees: Vec::new(),
            n_features: 0,
            fitted: false,
        }
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl Default for GradientBoosting {
    fn default() -> Self {
        Self::new(BoostingConfig::default())
    }
}

impl Regressor for GradientBoosting {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<(), TrainingError> {
        validate_training(NAME, x, y)?;
        let n = x.n_rows();
        let indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let base_score = y.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base_score; n];
        let mut residuals = vec![0.0; n];
        let mut trees = Vec::with_capacity(self.config.n_rounds);

        for round in 0..self.config.n_rounds {
            for i in 0..n {
                residuals[i] = y[i] - predictions[i];
            }
            let tree = RegressionTree::fit(x, &residuals, &indices, &self.config.tree, &mut rng);
            for (prediction, row) in predictions.iter_mut().zip(x.rows.iter()) {
                *prediction += self.config.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);

            if round % 25 == 0 {
                let mse = y
                    .iter()
                    .zip(predictions.iter())
                    .map(|(t, p)| (t - p).powi(2))
                    .sum::<f64>()
                    / n as f64;
                debug!(round, train_rmse = mse.sqrt(), "boosting progress");
            }
        }

        self.base_score = base_score;
        self.trees = trees;
        self.n_features = x.n_features();
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, TrainingError> {
        if !self.fitted {
            return Err(TrainingError::NotFitted {
                model: NAME.to_string(),
            });
        }
        validate_prediction(NAME, x, self.n_features)?;
        Ok(ensemble_predict(self, x))
    }

    fn as_tree_ensemble(&self) -> Option<&dyn TreeEnsemble> {
        Some(self)
    }
}

impl TreeEnsemble for GradientBoosting {
    fn offset(&self) -> f64 {
        self.base_score
    }

    fn weighted_trees(&self) -> Vec<(&RegressionTree, f64)> {
        self.trees
            .iter()
            .map(|tree| (tree, self.config.learning_rate))
            .collect()
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}

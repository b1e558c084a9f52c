//! Bootstrap-aggregated regression trees

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use super::tree::{RegressionTree, TreeConfig};
use super::{ensemble_predict, validate_prediction, validate_training, Regressor, TreeEnsemble};
use crate::error::TrainingError;
use crate::pipeline::FeatureMatrix;

const NAME: &str = "Random Forest";

#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub tree: TreeConfig,
    /// Sample rows with replacement for each tree
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeConfig::default(),
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl Regressor for RandomForest {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<(), TrainingError> {
        validate_training(NAME, x, y)?;
        let n = x.n_rows();

        // Seeds are drawn up front so the result does not depend on thread scheduling
        let mut master = ChaCha8Rng::seed_from_u64(self.config.seed);
        let seeds: Vec<u64> = (0..self.config.n_trees.max(1)).map(|_| master.gen()).collect();

        let config = &self.config;
        let trees: Vec<RegressionTree> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let indices: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(x, y, &indices, &config.tree, &mut rng)
            })
            .collect();

        debug!(
            trees = trees.len(),
            mean_depth = trees.iter().map(|t| t.depth()).sum::<usize>() as f64 / trees.len() as f64,
            "fitted random forest"
        );
        self.trees = trees;
        self.n_features = x.n_features();
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, TrainingError> {
        if self.trees.is_empty() {
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

impl TreeEnsemble for RandomForest {
    fn offset(&self) -> f64 {
        0.0
    }

    fn weighted_trees(&self) -> Vec<(&RegressionTree, f64)> {
        let weight = 1.0 / self.trees.len().max(1) as f64;
        self.trees.iter().map(|tree| (tree, weight)).collect()
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}

//! Fit-and-score orchestration for the three baseline models
//!
//! Models are evaluated one after another and isolated from each other: a
//! `TrainingError` in one model is logged and recorded in its outcome while
//! the remaining models still run.

use std::time::Instant;

use tracing::{error, info};

use super::boosting::{BoostingConfig, GradientBoosting};
use super::forest::{ForestConfig, RandomForest};
use super::linear::LinearRegression;
use super::metrics::RegressionMetrics;
use super::Regressor;
use crate::error::TrainingError;
use crate::pipeline::split::{SplitData, DEFAULT_SEED, DEFAULT_TEST_FRACTION};

/// Settings for the modeling branch
#[derive(Debug, Clone)]
pub struct ModelingConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub forest: ForestConfig,
    pub boosting: BoostingConfig,
}

impl Default for ModelingConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            forest: ForestConfig::default(),
            boosting: BoostingConfig::default(),
        }
    }
}

impl ModelingConfig {
    /// Linear regression, random forest and gradient boosting, in that order
    pub fn models(&self) -> Vec<Box<dyn Regressor>> {
        vec![
            Box::new(LinearRegression::new()),
            Box::new(RandomForest::new(self.forest.clone())),
            Box::new(GradientBoosting::new(self.boosting.clone())),
        ]
    }
}

/// A fitted model with its test-partition scores
pub struct TrainedModel {
    pub model: Box<dyn Regressor>,
    pub metrics: RegressionMetrics,
    pub fit_seconds: f64,
}

impl std::fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainedModel")
            .field("model", &self.model.name())
            .field("metrics", &self.metrics)
            .field("fit_seconds", &self.fit_seconds)
            .finish()
    }
}

/// Result of evaluating one model
#[derive(Debug)]
pub struct ModelOutcome {
    pub name: String,
    pub result: Result<TrainedModel, TrainingError>,
}

/// Fit every model on the training side and score it on the test side.
pub fn train_and_evaluate(split: &SplitData, models: Vec<Box<dyn Regressor>>) -> Vec<ModelOutcome> {
    models
        .into_iter()
        .map(|model| {
            let name = model.name().to_string();
            let result = fit_and_score(model, split);
            match &result {
                Ok(trained) => info!(
                    "{}: RMSE {:.4}, R² {:.4} (fit in {:.2}s)",
                    name, trained.metrics.rmse, trained.metrics.r2, trained.fit_seconds
                ),
                Err(e) => error!("{} failed: {}", name, e),
            }
            ModelOutcome { name, result }
        })
        .collect()
}

fn fit_and_score(mut model: Box<dyn Regressor>, split: &SplitData) -> Result<TrainedModel, TrainingError> {
    let started = Instant::now();
    model.fit(&split.x_train, &split.y_train)?;
    let fit_seconds = started.elapsed().as_secs_f64();

    let predictions = model.predict(&split.x_test)?;
    let metrics = RegressionMetrics::compute(&split.y_test, &predictions).ok_or_else(|| {
        TrainingError::LengthMismatch {
            model: model.name().to_string(),
            rows: predictions.len(),
            targets: split.y_test.len(),
        }
    })?;

    Ok(TrainedModel {
        model,
        metrics,
        fit_seconds,
    })
}

/// The successfully trained tree ensemble with the lowest test RMSE.
pub fn best_tree_model(outcomes: &[ModelOutcome]) -> Option<&TrainedModel> {
    outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().ok())
        .filter(|trained| trained.model.as_tree_ensemble().is_some())
        .min_by(|a, b| a.metrics.rmse.total_cmp(&b.metrics.rmse))
}

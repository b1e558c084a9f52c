//! Tests for the three regressors, scoring and the training loop

use claimlens::error::TrainingError;
use claimlens::models::*;
use claimlens::pipeline::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    FeatureMatrix::new((0..width).map(|j| format!("f{}", j)).collect(), rows)
}

fn step_data() -> (FeatureMatrix, Vec<f64>) {
    let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
    let y: Vec<f64> = (0..20).map(|i| if i > 9 { 10.0 } else { 0.0 }).collect();
    (matrix(rows), y)
}

fn small_config() -> ModelingConfig {
    ModelingConfig {
        forest: ForestConfig {
            n_trees: 20,
            ..ForestConfig::default()
        },
        boosting: BoostingConfig {
            n_rounds: 30,
            ..BoostingConfig::default()
        },
        ..ModelingConfig::default()
    }
}

/// Always fails, to check that one model's failure is contained
struct Broken;

impl Regressor for Broken {
    fn name(&self) -> &str {
        "Broken"
    }

    fn fit(&mut self, _x: &FeatureMatrix, _y: &[f64]) -> Result<(), TrainingError> {
        Err(TrainingError::Singular {
            model: "Broken".to_string(),
        })
    }

    fn predict(&self, _x: &FeatureMatrix) -> Result<Vec<f64>, TrainingError> {
        Err(TrainingError::NotFitted {
            model: "Broken".to_string(),
        })
    }
}

#[test]
fn test_linear_regression_recovers_exact_coefficients() {
    let rows: Vec<Vec<f64>> = (0..30)
        .map(|i| {
            let a = i as f64;
            let b = ((i * 7) % 11) as f64;
            vec![a, b]
        })
        .collect();
    let y: Vec<f64> = rows.iter().map(|r| 3.0 + 2.0 * r[0] - r[1]).collect();
    let x = matrix(rows);

    let mut model = LinearRegression::new();
    model.fit(&x, &y).unwrap();

    assert_close(model.intercept(), 3.0, 1e-6);
    assert_close(model.coefficients()[0], 2.0, 1e-6);
    assert_close(model.coefficients()[1], -1.0, 1e-6);

    let predictions = model.predict(&x).unwrap();
    let metrics = RegressionMetrics::compute(&y, &predictions).unwrap();
    assert!(metrics.rmse < 1e-6);
    assert!(metrics.r2 > 0.999_999);
}

#[test]
fn test_predict_before_fit_is_an_error() {
    let x = matrix(vec![vec![1.0]]);

    let models: [Box<dyn Regressor>; 3] = [
        Box::new(LinearRegression::new()),
        Box::new(RandomForest::default()),
        Box::new(GradientBoosting::default()),
    ];
    for model in models {
        match model.predict(&x) {
            Err(TrainingError::NotFitted { model: name }) => assert_eq!(name, model.name()),
            other => panic!("expected NotFitted for {}, got {:?}", model.name(), other),
        }
    }
}

#[test]
fn test_shape_and_value_checks_name_the_model() {
    let x = matrix(vec![vec![1.0], vec![2.0]]);

    let mut forest = RandomForest::default();
    let err = forest.fit(&x, &[1.0]).unwrap_err();
    assert!(matches!(err, TrainingError::LengthMismatch { rows: 2, targets: 1, .. }));
    assert_eq!(err.model(), "Random Forest");

    let mut linear = LinearRegression::new();
    let err = linear.fit(&x, &[1.0, f64::NAN]).unwrap_err();
    assert!(matches!(err, TrainingError::NonFinite { .. }));

    let mut boosting = GradientBoosting::default();
    let err = boosting.fit(&matrix(vec![]), &[]).unwrap_err();
    assert!(matches!(err, TrainingError::EmptyTrainingSet { .. }));
    assert_eq!(err.model(), "Gradient Boosting");
}

#[test]
fn test_prediction_with_wrong_feature_count_fails() {
    let (x, y) = step_data();
    let mut forest = RandomForest::new(ForestConfig {
        n_trees: 5,
        ..ForestConfig::default()
    });
    forest.fit(&x, &y).unwrap();

    let wide = matrix(vec![vec![1.0, 2.0]]);
    assert!(matches!(
        forest.predict(&wide),
        Err(TrainingError::FeatureMismatch { expected: 1, got: 2, .. })
    ));
}

#[test]
fn test_random_forest_learns_a_step() {
    let (x, y) = step_data();
    let mut forest = RandomForest::new(ForestConfig {
        n_trees: 50,
        ..ForestConfig::default()
    });
    forest.fit(&x, &y).unwrap();

    assert_eq!(forest.trees().len(), 50);
    let predictions = forest.predict(&matrix(vec![vec![1.0], vec![18.0]])).unwrap();
    assert!(predictions[0] < 1.0, "low side predicted {}", predictions[0]);
    assert!(predictions[1] > 9.0, "high side predicted {}", predictions[1]);
}

#[test]
fn test_random_forest_is_deterministic_for_a_seed() {
    let df = create_modeling_dataframe(150, 11);
    let cleaned = filter_claims(&df, &ClaimFilter::default()).unwrap();
    let data = build_features(&cleaned.table, &FeatureSpec::default()).unwrap();
    let config = ForestConfig {
        n_trees: 10,
        ..ForestConfig::default()
    };

    let mut first = RandomForest::new(config.clone());
    let mut second = RandomForest::new(config);
    first.fit(&data.features, &data.target).unwrap();
    second.fit(&data.features, &data.target).unwrap();

    assert_eq!(
        first.predict(&data.features).unwrap(),
        second.predict(&data.features).unwrap()
    );
}

#[test]
fn test_gradient_boosting_fits_training_data() {
    let rows: Vec<Vec<f64>> = (0..100).map(|i| vec![i as f64]).collect();
    let y: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let x = matrix(rows);

    let mut boosting = GradientBoosting::default();
    boosting.fit(&x, &y).unwrap();

    assert_eq!(boosting.trees().len(), 100);
    assert_close(boosting.base_score(), 49.5, 1e-12);
    let metrics = RegressionMetrics::compute(&y, &boosting.predict(&x).unwrap()).unwrap();
    assert!(metrics.r2 > 0.95, "R² was {}", metrics.r2);
}

#[test]
fn test_metrics_on_known_values() {
    let metrics = RegressionMetrics::compute(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]).unwrap();

    assert_close(metrics.mse, 1.0 / 3.0, 1e-12);
    assert_close(metrics.rmse, (1.0f64 / 3.0).sqrt(), 1e-12);
    assert_close(metrics.mae, 1.0 / 3.0, 1e-12);
    assert_close(metrics.r2, 0.5, 1e-12);
    assert_eq!(metrics.n, 3);
    assert!(RegressionMetrics::compute(&[], &[]).is_none());
}

#[test]
fn test_one_failing_model_does_not_stop_the_others() {
    let (x, y) = step_data();
    let partition = train_test_split(x.n_rows(), 0.2, 42).unwrap();
    let split = partition.apply(&x, &y).unwrap();
    let models: Vec<Box<dyn Regressor>> = vec![
        Box::new(LinearRegression::new()),
        Box::new(Broken),
        Box::new(RandomForest::new(ForestConfig {
            n_trees: 10,
            ..ForestConfig::default()
        })),
    ];

    let outcomes = train_and_evaluate(&split, models);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].result.is_ok());
    assert_eq!(outcomes[1].name, "Broken");
    assert!(matches!(&outcomes[1].result, Err(e) if e.model() == "Broken"));
    assert!(outcomes[2].result.is_ok());
    assert_eq!(outcomes[2].result.as_ref().unwrap().metrics.n, 4);
}

#[test]
fn test_end_to_end_training_on_synthetic_claims() {
    let df = create_modeling_dataframe(400, 5);
    let cleaned = filter_claims(&df, &ClaimFilter::default()).unwrap();
    let data = build_features(&cleaned.table, &FeatureSpec::default()).unwrap();
    let config = small_config();
    let split = train_test_split(data.features.n_rows(), config.test_fraction, config.seed)
        .unwrap()
        .apply(&data.features, &data.target)
        .unwrap();

    let outcomes = train_and_evaluate(&split, config.models());

    let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Linear Regression", "Random Forest", "Gradient Boosting"]);
    for outcome in &outcomes {
        let trained = outcome.result.as_ref().unwrap();
        assert_eq!(trained.metrics.n, 64);
        assert!(trained.metrics.rmse.is_finite());
    }
    let linear = outcomes[0].result.as_ref().unwrap();
    assert!(linear.metrics.r2 > 0.9, "linear R² was {}", linear.metrics.r2);
    for outcome in &outcomes[1..] {
        let r2 = outcome.result.as_ref().unwrap().metrics.r2;
        assert!(r2 > 0.5, "{} R² was {}", outcome.name, r2);
    }
}

#[test]
fn test_best_tree_model_ignores_linear_and_failures() {
    let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
    let y: Vec<f64> = (0..40).map(|i| 2.0 * i as f64).collect();
    let x = matrix(rows);
    let split = train_test_split(40, 0.25, 42).unwrap().apply(&x, &y).unwrap();
    let config = small_config();

    let mut models = config.models();
    models.push(Box::new(Broken));
    let outcomes = train_and_evaluate(&split, models);

    // Linear is exact here but has no tree view
    let best = best_tree_model(&outcomes).unwrap();
    assert!(best.model.as_tree_ensemble().is_some());
    let tree_rmse: Vec<f64> = outcomes[1..3]
        .iter()
        .map(|o| o.result.as_ref().unwrap().metrics.rmse)
        .collect();
    assert_eq!(best.metrics.rmse, tree_rmse.iter().copied().fold(f64::INFINITY, f64::min));

    assert!(best_tree_model(&outcomes[..1]).is_none());
}

//! Modeling branch: clean, encode, split, fit, score and explain

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::args::ModelArgs;
use crate::models::{best_tree_model, explain, train_and_evaluate, BoostingConfig, ForestConfig, ModelingConfig};
use crate::pipeline::{build_features, filter_claims, load_dataset, train_test_split, ClaimFilter, FeatureSpec, LoadOptions};
use crate::report::{display_attribution, display_clean_outcome, display_model_scoreboard, DEFAULT_TOP_ROWS};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_chart, print_completion,
    print_config, print_info, print_step_header, print_step_time, print_success, print_warning,
};
use crate::viz::plot_attribution;

impl ModelArgs {
    /// Model settings with the command-line overrides applied
    pub fn modeling_config(&self) -> ModelingConfig {
        ModelingConfig {
            test_fraction: self.test_fraction,
            seed: self.seed,
            forest: ForestConfig {
                n_trees: self.n_trees,
                seed: self.seed,
                ..ForestConfig::default()
            },
            boosting: BoostingConfig {
                n_rounds: self.boosting_rounds,
                learning_rate: self.learning_rate,
                seed: self.seed,
                ..BoostingConfig::default()
            },
        }
    }
}

/// Run the modeling branch with the given command-line settings
pub fn run_model(args: &ModelArgs) -> Result<()> {
    let config = args.modeling_config();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        &args.input,
        &[
            ("Seed", config.seed.to_string()),
            ("Test fraction", format!("{:.2}", config.test_fraction)),
            ("Forest trees", config.forest.n_trees.to_string()),
            ("Boosting rounds", config.boosting.n_rounds.to_string()),
            ("Learning rate", format!("{}", config.boosting.learning_rate)),
        ],
    );

    // Step 1: Load and clean
    print_step_header(1, "Load and Clean");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading dataset...");
    let filter = ClaimFilter::default();
    // The coerced column is parsed by the cleaning pass, not by the reader
    let options = LoadOptions {
        separator: args.separator,
        infer_schema_length: args.infer_schema_length,
        text_columns: filter.coerce_numeric.iter().cloned().collect(),
    };
    let df = load_dataset(&args.input, &options)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    finish_with_success(
        &spinner,
        &format!("Loaded {} rows x {} columns", df.height(), df.width()),
    );

    let cleaned = filter_claims(&df, &filter)?;
    display_clean_outcome(&cleaned);
    print_step_time(step_start.elapsed());

    // Step 2: Features and split
    print_step_header(2, "Features and Split");
    let step_start = Instant::now();
    let data = build_features(&cleaned.table, &FeatureSpec::default())?;
    info!(
        "Feature matrix: {} rows x {} features ({} incomplete rows dropped)",
        data.features.n_rows(),
        data.features.n_features(),
        data.dropped_incomplete
    );
    for levels in &data.categories {
        info!(
            "{}: baseline level {:?}, {} indicator(s)",
            levels.column,
            levels.dropped,
            levels.encoded.len()
        );
    }

    let partition = train_test_split(data.features.n_rows(), config.test_fraction, config.seed)?;
    let split = partition.apply(&data.features, &data.target)?;
    print_success(&format!(
        "{} features, {} train / {} test rows",
        data.features.n_features(),
        split.y_train.len(),
        split.y_test.len()
    ));
    print_step_time(step_start.elapsed());

    // Step 3: Train and evaluate
    print_step_header(3, "Train and Evaluate");
    let step_start = Instant::now();
    let spinner = create_spinner("Fitting linear, random forest and gradient boosting models...");
    let outcomes = train_and_evaluate(&split, config.models());
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed == 0 {
        finish_with_success(&spinner, "All models fitted");
    } else {
        finish_with_warning(&spinner, &format!("{} model(s) failed", failed));
    }
    display_model_scoreboard(&outcomes);
    if failed == outcomes.len() {
        anyhow::bail!("Every model failed to train; see the log for details");
    }
    print_step_time(step_start.elapsed());

    // Step 4: Explain the best tree ensemble
    print_step_header(4, "Explain");
    let step_start = Instant::now();
    let best = best_tree_model(&outcomes).and_then(|trained| {
        trained
            .model
            .as_tree_ensemble()
            .map(|ensemble| (trained.model.name(), ensemble))
    });
    match best {
        None => {
            warn!("No tree ensemble trained; skipping attribution");
            print_warning("No tree ensemble available to explain");
        }
        Some((name, ensemble)) => {
            let spinner = create_spinner(&format!("Attributing {} test rows...", split.x_test.n_rows()));
            let attribution = explain(ensemble, &split.x_test)?;
            finish_with_success(&spinner, &format!("Explained {}", name));
            let ranking = attribution.global_ranking();
            display_attribution(name, &ranking, DEFAULT_TOP_ROWS);

            if args.no_charts {
                print_info("Chart rendering disabled (--no-charts)");
            } else {
                match plot_attribution(&attribution, &args.charts_dir) {
                    Ok(path) => print_chart(&path),
                    Err(e) => {
                        warn!("{}", e);
                        print_warning(&e.to_string());
                    }
                }
            }
        }
    }
    print_step_time(step_start.elapsed());

    print_completion("Claimlens modeling");
    Ok(())
}

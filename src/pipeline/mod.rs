//! Pipeline module - loading and the modeling-branch table stages

pub mod clean;
pub mod columns;
pub mod features;
pub mod loader;
pub mod split;
pub mod summary;

pub use clean::{filter_claims, ClaimFilter, CleanOutcome};
pub use features::{build_features, CategoryLevels, FeatureMatrix, FeatureSpec, ModelingData};
pub use loader::*;
pub use split::{train_test_split, Partition, SplitData, DEFAULT_SEED, DEFAULT_TEST_FRACTION};
pub use summary::{summarize, CategoricalSummary, DataSummary, NumericSummary};

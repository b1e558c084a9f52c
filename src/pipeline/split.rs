//! Seeded train/test partition of row indices

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::features::FeatureMatrix;
use crate::error::DataError;

/// Default share of rows held out for testing
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Default split seed
pub const DEFAULT_SEED: u64 = 42;

/// Disjoint train/test row indices covering `0..n_rows`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Feature rows and targets on both sides of a partition
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: FeatureMatrix,
    pub y_train: Vec<f64>,
    pub x_test: FeatureMatrix,
    pub y_test: Vec<f64>,
}

impl Partition {
    /// Gather features and targets for each side.
    pub fn apply(&self, features: &FeatureMatrix, target: &[f64]) -> Result<SplitData, DataError> {
        if features.n_rows() != target.len() {
            return Err(DataError::InvalidParameter(format!(
                "feature rows ({}) and target length ({}) differ",
                features.n_rows(),
                target.len()
            )));
        }
        if let Some(&out_of_range) = self
            .train
            .iter()
            .chain(self.test.iter())
            .find(|&&i| i >= target.len())
        {
            return Err(DataError::InvalidParameter(format!(
                "partition row {} is out of range for {} rows",
                out_of_range,
                target.len()
            )));
        }

        Ok(SplitData {
            x_train: features.select(&self.train),
            y_train: self.train.iter().map(|&i| target[i]).collect(),
            x_test: features.select(&self.test),
            y_test: self.test.iter().map(|&i| target[i]).collect(),
        })
    }
}

/// Shuffle `0..n_rows` with a seeded generator and cut off the test share.
///
/// The test side gets `ceil(test_fraction * n_rows)` rows. Both sides must end
/// up non-empty.
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> Result<Partition, DataError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidParameter(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    let n_test = (test_fraction * n_rows as f64).ceil() as usize;
    if n_rows < 2 || n_test >= n_rows {
        return Err(DataError::InvalidParameter(format!(
            "cannot split {} rows with test fraction {}",
            n_rows, test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(Partition {
        train,
        test: indices,
    })
}

//! CART regression tree stored as a flat node arena
//!
//! Splits maximise the reduction of the regularised squared-error score
//! `sum^2 / (count + lambda)`. With `lambda = 0` this is the classic variance
//! reduction criterion; with `lambda > 0` it matches second-order boosting
//! on squared error, where the leaf weight is `sum / (count + lambda)`.
//! Rows with `x[feature] <= threshold` go left.

use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;

use crate::pipeline::FeatureMatrix;

/// Growth limits for a single tree
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` considers all of them
    pub max_features: Option<usize>,
    /// L2 penalty on leaf weights
    pub lambda: f64,
    /// Minimum score gain required to keep a split
    pub min_split_gain: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            lambda: 0.0,
            min_split_gain: 0.0,
        }
    }
}

/// One node of the arena. Leaves have `feature == None`.
#[derive(Debug, Clone)]
pub struct Node {
    pub feature: Option<usize>,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
    /// Leaf weight, also kept on internal nodes for inspection
    pub value: f64,
    /// Training rows that reached this node (bootstrap duplicates counted)
    pub n_samples: usize,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.feature.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    /// Rows in the left child after sorting by `feature`
    left_count: usize,
}

/// Fitted regression tree; node 0 is the root
#[derive(Debug, Clone, Default)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl RegressionTree {
    /// Grow a tree on the given rows of `x`. Repeated indices act as weights.
    pub fn fit(
        x: &FeatureMatrix,
        y: &[f64],
        indices: &[usize],
        config: &TreeConfig,
        rng: &mut ChaCha8Rng,
    ) -> RegressionTree {
        let mut tree = RegressionTree {
            nodes: Vec::new(),
            n_features: x.n_features(),
        };
        let mut rows = indices.to_vec();
        if !rows.is_empty() {
            tree.grow(x, y, &mut rows, config, rng);
        }
        tree
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut pending = vec![(0usize, 0usize)];
        while let Some((at, depth)) = pending.pop() {
            let node = &self.nodes[at];
            if node.is_leaf() {
                deepest = deepest.max(depth);
            } else {
                pending.push((node.left, depth + 1));
                pending.push((node.right, depth + 1));
            }
        }
        deepest
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        let mut at = 0;
        loop {
            let node = &self.nodes[at];
            match node.feature {
                None => return node.value,
                Some(f) => at = if row[f] <= node.threshold { node.left } else { node.right },
            }
        }
    }

    /// Mean prediction over the training rows (leaf values weighted by cover)
    pub fn expected_value(&self) -> f64 {
        let Some(root) = self.nodes.first() else {
            return 0.0;
        };
        if root.n_samples == 0 {
            return 0.0;
        }
        let weighted: f64 = self
            .nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.value * n.n_samples as f64)
            .sum();
        weighted / root.n_samples as f64
    }

    /// Grows depth-first from an explicit work list, so tree depth is bounded
    /// by the row count rather than by the thread's stack.
    fn grow(
        &mut self,
        x: &FeatureMatrix,
        y: &[f64],
        rows: &mut [usize],
        config: &TreeConfig,
        rng: &mut ChaCha8Rng,
    ) {
        self.nodes.push(leaf(y, rows, config.lambda));
        let mut pending = vec![PendingNode {
            at: 0,
            start: 0,
            end: rows.len(),
            depth: 0,
        }];

        while let Some(task) = pending.pop() {
            let span = &mut rows[task.start..task.end];
            let count = span.len();
            let depth_exhausted = config.max_depth.is_some_and(|max| task.depth >= max);
            if depth_exhausted || count < config.min_samples_split.max(2) || is_pure(y, span) {
                continue;
            }

            let sum: f64 = span.iter().map(|&i| y[i]).sum();
            let Some(split) = self.best_split(x, y, span, sum, config, rng) else {
                continue;
            };
            span.sort_by(|&a, &b| x.rows[a][split.feature].total_cmp(&x.rows[b][split.feature]));

            let mid = task.start + split.left_count;
            let left = self.nodes.len();
            self.nodes.push(leaf(y, &rows[task.start..mid], config.lambda));
            let right = self.nodes.len();
            self.nodes.push(leaf(y, &rows[mid..task.end], config.lambda));

            let node = &mut self.nodes[task.at];
            node.feature = Some(split.feature);
            node.threshold = split.threshold;
            node.left = left;
            node.right = right;

            // Right first so the left subtree is grown first
            pending.push(PendingNode {
                at: right,
                start: mid,
                end: task.end,
                depth: task.depth + 1,
            });
            pending.push(PendingNode {
                at: left,
                start: task.start,
                end: mid,
                depth: task.depth + 1,
            });
        }
    }

    fn best_split(
        &self,
        x: &FeatureMatrix,
        y: &[f64],
        rows: &[usize],
        sum: f64,
        config: &TreeConfig,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.n_features();
        let candidates: Vec<usize> = match config.max_features {
            Some(k) if k < n_features => sample(rng, n_features, k.max(1)).into_vec(),
            _ => (0..n_features).collect(),
        };

        let count = rows.len();
        let lambda = config.lambda;
        let parent_score = sum * sum / (count as f64 + lambda);
        let min_leaf = config.min_samples_leaf.max(1);
        let mut best: Option<SplitCandidate> = None;
        let mut sorted: Vec<(f64, f64)> = Vec::with_capacity(count);

        for feature in candidates {
            sorted.clear();
            sorted.extend(rows.iter().map(|&i| (x.rows[i][feature], y[i])));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for i in 0..count - 1 {
                left_sum += sorted[i].1;
                let left_count = i + 1;
                let right_count = count - left_count;
                if left_count < min_leaf {
                    continue;
                }
                if right_count < min_leaf {
                    break;
                }
                let (here, next) = (sorted[i].0, sorted[i + 1].0);
                if here >= next {
                    continue;
                }

                let right_sum = sum - left_sum;
                let gain = left_sum * left_sum / (left_count as f64 + lambda)
                    + right_sum * right_sum / (right_count as f64 + lambda)
                    - parent_score;
                if gain <= config.min_split_gain || best.is_some_and(|b| gain <= b.gain) {
                    continue;
                }

                let mid = here + (next - here) / 2.0;
                let threshold = if mid < next { mid } else { here };
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                    left_count,
                });
            }
        }
        best
    }
}

/// Node awaiting a split decision, covering `rows[start..end]`
#[derive(Debug, Clone, Copy)]
struct PendingNode {
    at: usize,
    start: usize,
    end: usize,
    depth: usize,
}

fn leaf(y: &[f64], rows: &[usize], lambda: f64) -> Node {
    let sum: f64 = rows.iter().map(|&i| y[i]).sum();
    Node {
        feature: None,
        threshold: 0.0,
        left: 0,
        right: 0,
        value: sum / (rows.len() as f64 + lambda),
        n_samples: rows.len(),
    }
}

fn is_pure(y: &[f64], rows: &[usize]) -> bool {
    let first = y[rows[0]];
    rows.iter().all(|&i| y[i] == first)
}

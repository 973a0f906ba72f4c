//! CART regression tree with squared-error splits.
//!
//! Splits are searched exhaustively: for every candidate feature the node's
//! samples are sorted by that feature and every boundary between two distinct
//! values is scored with prefix sums. Thresholds sit at the midpoint of the two
//! neighbouring values; a sample goes left when `x <= threshold`.
//!
//! Feature importance is the total weighted decrease in squared error produced
//! by the splits on each feature, normalized to sum to 1 (all zeros when the
//! tree never splits).

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::index;

use crate::error::AppError;

/// Variance below which a node is treated as pure.
const PURE_EPS: f64 = 1e-12;

/// Structural parameters shared by every tree of a forest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Features drawn per split; `n_features` disables sub-sampling.
    pub max_features: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: TreeNode,
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct Builder<'a> {
    x: &'a DMatrix<f64>,
    y: &'a [f64],
    params: TreeParams,
    rng: &'a mut StdRng,
    importances: Vec<f64>,
}

impl RegressionTree {
    /// Fit a tree on the rows listed in `samples` (duplicates allowed, as
    /// produced by bootstrap sampling).
    pub fn fit(
        x: &DMatrix<f64>,
        y: &[f64],
        samples: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, AppError> {
        if x.nrows() != y.len() {
            return Err(AppError::new(
                2,
                format!("Shape mismatch: {} rows vs {} labels.", x.nrows(), y.len()),
            ));
        }
        if samples.is_empty() {
            return Err(AppError::new(3, "Cannot fit a tree on zero samples."));
        }
        if params.max_features == 0 || params.max_features > x.ncols() {
            return Err(AppError::new(
                2,
                format!(
                    "max_features must be in 1..={}, got {}.",
                    x.ncols(),
                    params.max_features
                ),
            ));
        }

        let mut builder = Builder {
            x,
            y,
            params,
            rng,
            importances: vec![0.0; x.ncols()],
        };
        let root = builder.build(samples, 0);

        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        Ok(Self {
            root,
            importances,
        })
    }

    /// Normalized impurity-decrease importances (one per feature).
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }

    pub fn n_leaves(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => walk(left) + walk(right),
            }
        }
        walk(&self.root)
    }
}

impl Builder<'_> {
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> TreeNode {
        let n = samples.len();
        let (sum, sq_sum) = sums(self.y, &samples);
        let leaf = TreeNode::Leaf {
            value: sum / n as f64,
            n_samples: n,
        };

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        let too_small = n < self.params.min_samples_split || n < 2 * self.params.min_samples_leaf;
        if depth_reached || too_small || sse(n, sum, sq_sum) / n as f64 <= PURE_EPS {
            return leaf;
        }

        let Some(split) = self.best_split(&samples, sum) else {
            return leaf;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| self.x[(i, split.feature)] <= split.threshold);

        let (l_sum, l_sq) = sums(self.y, &left);
        let (r_sum, r_sq) = sums(self.y, &right);
        let decrease = sse(n, sum, sq_sum) - sse(left.len(), l_sum, l_sq) - sse(right.len(), r_sum, r_sq);
        self.importances[split.feature] += decrease.max(0.0);

        let left = Box::new(self.build(left, depth + 1));
        let right = Box::new(self.build(right, depth + 1));
        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples: n,
        }
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        if self.params.max_features >= n_features {
            (0..n_features).collect()
        } else {
            let mut picked = index::sample(&mut *self.rng, n_features, self.params.max_features).into_vec();
            picked.sort_unstable();
            picked
        }
    }

    /// Best split by the proxy `S_l² / n_l + S_r² / n_r`, which ranks splits
    /// the same way as the decrease in squared error.
    fn best_split(&mut self, samples: &[usize], total: f64) -> Option<SplitCandidate> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<SplitCandidate> = None;
        let mut column: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in self.candidate_features() {
            column.clear();
            column.extend(samples.iter().map(|&i| (self.x[(i, feature)], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += column[k].1;
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let (lo, hi) = (column[k].0, column[k + 1].0);
                if lo >= hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                if best.as_ref().is_none_or(|b| score > b.score) {
                    let mid = lo + (hi - lo) / 2.0;
                    let threshold = if mid >= hi { lo } else { mid };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        best
    }
}

fn sums(y: &[f64], samples: &[usize]) -> (f64, f64) {
    samples.iter().fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]))
}

/// Sum of squared deviations from the mean.
fn sse(n: usize, sum: f64, sq_sum: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (sq_sum - sum * sum / n as f64).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params(n_features: usize) -> TreeParams {
        TreeParams {
            max_features: n_features,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    #[test]
    fn step_function_is_learned_exactly() {
        // y depends only on column 0; column 1 is constant.
        let x = DMatrix::from_row_slice(6, 2, &[0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0, 1.0, 5.0, 1.0]);
        let y = [1.0, 1.0, 1.0, 9.0, 9.0, 9.0];
        let mut rng = StdRng::seed_from_u64(0);

        let tree = RegressionTree::fit(&x, &y, (0..6).collect(), params(2), &mut rng).unwrap();

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.predict_row(&[2.4, 1.0]), 1.0);
        assert_eq!(tree.predict_row(&[2.6, 1.0]), 9.0);
        assert_eq!(tree.feature_importances(), &[1.0, 0.0]);
    }

    #[test]
    fn constant_target_gives_single_leaf_and_zero_importance() {
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let y = [4.0, 4.0, 4.0];
        let mut rng = StdRng::seed_from_u64(0);

        let tree = RegressionTree::fit(&x, &y, vec![0, 1, 2], params(1), &mut rng).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.feature_importances(), &[0.0]);
        assert_eq!(tree.predict_row(&[100.0]), 4.0);
    }

    #[test]
    fn max_depth_limits_growth() {
        let x = DMatrix::from_row_slice(8, 1, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let y: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = params(1);
        p.max_depth = Some(2);

        let tree = RegressionTree::fit(&x, &y, (0..8).collect(), p, &mut rng).unwrap();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.n_leaves(), 4);
    }

    #[test]
    fn min_samples_leaf_is_respected() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = [0.0, 0.0, 0.0, 10.0];
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = params(1);
        p.min_samples_leaf = 2;

        let tree = RegressionTree::fit(&x, &y, (0..4).collect(), p, &mut rng).unwrap();
        // The only legal split is 2 | 2.
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_row(&[3.0]), 5.0);
    }

    #[test]
    fn rejects_invalid_max_features() {
        let x = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = params(1);
        p.max_features = 2;
        let err = RegressionTree::fit(&x, &[0.0, 1.0], vec![0, 1], p, &mut rng).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

//! Recursive tree construction.
//!
//! Rows are tracked as index lists into the training set, so each recursion
//! step only allocates the two child index lists, never a copy of the matrix.

use crate::domain::{ArmStats, TrainingSet, UpliftConfig};
use crate::error::UpliftError;
use crate::fit::split::find_best_split;
use crate::tree::{Node, NodeStats};

/// Builds one tree over a validated training set.
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder<'a> {
    data: TrainingSet<'a>,
    config: UpliftConfig,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(data: TrainingSet<'a>, config: UpliftConfig) -> Self {
        Self { data, config }
    }

    /// Grow the full tree from all rows of the training set.
    ///
    /// Fails if the rows do not contain both treated and control observations,
    /// since the root effect is undefined then.
    pub fn build(&self) -> Result<Node, UpliftError> {
        let rows: Vec<usize> = (0..self.data.n_rows()).collect();
        let arms = ArmStats::from_rows(&self.data, &rows);
        let stats = NodeStats::from_arms(&arms).ok_or(UpliftError::DegenerateRoot {
            treated: arms.treated_count,
            control: arms.control_count,
        })?;

        Ok(self.grow(rows, stats, 0))
    }

    fn grow(&self, rows: Vec<usize>, stats: NodeStats, depth: usize) -> Node {
        debug_assert_eq!(rows.len(), stats.sample_count);

        if depth >= self.config.max_depth {
            return Node::leaf(stats);
        }

        let Some(best) = find_best_split(&self.data, &rows, stats.effect_estimate, &self.config) else {
            log::debug!(
                "depth {depth}: no split beats effect {:.6} over {} rows",
                stats.effect_estimate,
                stats.sample_count
            );
            return Node::leaf(stats);
        };

        log::debug!(
            "depth {depth}: split feature {} at {:.6} (score {:.6}, rows {} -> {} / {})",
            best.split.feature,
            best.split.threshold,
            best.score,
            stats.sample_count,
            best.left.sample_count,
            best.right.sample_count
        );

        let split = best.split;
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| split.goes_left(self.data.value(r, split.feature)));

        let left = self.grow(left_rows, best.left, depth + 1);
        let right = self.grow(right_rows, best.right, depth + 1);
        Node::internal(stats, split, left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn config(max_depth: usize) -> UpliftConfig {
        UpliftConfig {
            max_depth,
            min_samples_leaf: 4,
            min_samples_leaf_treated: 2,
            min_samples_leaf_control: 2,
        }
    }

    /// 40 rows on one feature; effect 0 / 4 / 20 across three bands.
    fn banded() -> (DMatrix<f64>, Vec<u8>, Vec<f64>) {
        let n = 40;
        let x = DMatrix::from_iterator(n, 1, (0..n).map(|i| i as f64));
        let t: Vec<u8> = (0..n).map(|i| (i % 2) as u8).collect();
        let y: Vec<f64> = (0..n)
            .map(|i| {
                let effect = match i {
                    0..=19 => 0.0,
                    20..=29 => 4.0,
                    _ => 20.0,
                };
                if i % 2 == 1 { effect } else { 0.0 }
            })
            .collect();
        (x, t, y)
    }

    #[test]
    fn depth_zero_is_root_only() {
        let (x, t, y) = banded();
        let data = TrainingSet::new(&x, &t, &y).unwrap();
        let root = TreeBuilder::new(data, config(0)).build().unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.sample_count(), 40);
        // treated mean (10 * 0 + 5 * 4 + 5 * 20) / 20 = 6
        assert_eq!(root.effect_estimate(), 6.0);
    }

    #[test]
    fn children_partition_the_parent() {
        let (x, t, y) = banded();
        let data = TrainingSet::new(&x, &t, &y).unwrap();
        let root = TreeBuilder::new(data, config(3)).build().unwrap();

        assert!(!root.is_leaf());
        assert!(root.depth() <= 3);

        fn check(node: &Node) {
            if let Some((left, right)) = node.children() {
                let s = node.stats();
                assert_eq!(left.sample_count() + right.sample_count(), s.sample_count);
                assert_eq!(left.stats().treated_count + right.stats().treated_count, s.treated_count);
                assert_eq!(left.stats().control_count + right.stats().control_count, s.control_count);
                check(left);
                check(right);
            }
        }
        check(&root);
    }

    #[test]
    fn degenerate_root_is_an_error() {
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let y = vec![1.0, 2.0, 3.0];

        let treated_only = vec![1, 1, 1];
        let data = TrainingSet::new(&x, &treated_only, &y).unwrap();
        assert_eq!(
            TreeBuilder::new(data, config(2)).build().unwrap_err(),
            UpliftError::DegenerateRoot { treated: 3, control: 0 }
        );

        let empty = DMatrix::<f64>::zeros(0, 2);
        let data = TrainingSet::new(&empty, &[], &[]).unwrap();
        assert_eq!(
            TreeBuilder::new(data, config(2)).build().unwrap_err(),
            UpliftError::DegenerateRoot { treated: 0, control: 0 }
        );
    }
}

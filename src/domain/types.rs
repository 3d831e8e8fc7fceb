//! Shared domain types.
//!
//! These are kept small and (where it matters) serializable so they can be:
//!
//! - used in-memory during fitting
//! - persisted inside model files
//! - reported back to the user

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::UpliftError;

/// Upper bound on `max_depth`; the builder recurses once per level.
pub const MAX_DEPTH_LIMIT: usize = 64;

/// Tree growth configuration.
///
/// All four values are fixed at construction time and never change while the
/// model lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpliftConfig {
    /// Maximum number of edges between the root and any leaf.
    ///
    /// Capped at `MAX_DEPTH_LIMIT`; `validate` rejects larger values.
    pub max_depth: usize,
    /// Minimum total rows on each side of a split.
    pub min_samples_leaf: usize,
    /// Minimum treated rows on each side of a split.
    pub min_samples_leaf_treated: usize,
    /// Minimum control rows on each side of a split.
    pub min_samples_leaf_control: usize,
}

impl Default for UpliftConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_leaf: 1000,
            min_samples_leaf_treated: 300,
            min_samples_leaf_control: 300,
        }
    }
}

impl UpliftConfig {
    pub fn validate(&self) -> Result<(), UpliftError> {
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(UpliftError::InvalidConfig(format!(
                "max_depth must be <= {MAX_DEPTH_LIMIT}, got {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Whether a candidate partition leaves enough rows of every kind on both sides.
    pub fn allows_split(&self, left: &ArmStats, right: &ArmStats) -> bool {
        left.sample_count().min(right.sample_count()) >= self.min_samples_leaf
            && left.treated_count.min(right.treated_count) >= self.min_samples_leaf_treated
            && left.control_count.min(right.control_count) >= self.min_samples_leaf_control
    }
}

/// Borrowed, validated view over a training sample set.
///
/// Invariants (checked by `new`): `treatment` and `y` have one entry per row of
/// `x`, treatment values are 0 or 1, outcomes are finite.
#[derive(Debug, Clone, Copy)]
pub struct TrainingSet<'a> {
    x: &'a DMatrix<f64>,
    treatment: &'a [u8],
    y: &'a [f64],
}

impl<'a> TrainingSet<'a> {
    pub fn new(x: &'a DMatrix<f64>, treatment: &'a [u8], y: &'a [f64]) -> Result<Self, UpliftError> {
        let n = x.nrows();
        if treatment.len() != n {
            return Err(UpliftError::LengthMismatch {
                what: "treatment",
                expected: n,
                got: treatment.len(),
            });
        }
        if y.len() != n {
            return Err(UpliftError::LengthMismatch {
                what: "outcome",
                expected: n,
                got: y.len(),
            });
        }
        if let Some((row, &value)) = treatment.iter().enumerate().find(|(_, t)| **t > 1) {
            return Err(UpliftError::NonBinaryTreatment { row, value });
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(UpliftError::NonFiniteOutcome { row });
        }
        Ok(Self { x, treatment, y })
    }

    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.x[(row, feature)]
    }

    pub fn is_treated(&self, row: usize) -> bool {
        self.treatment[row] == 1
    }

    pub fn outcome(&self, row: usize) -> f64 {
        self.y[row]
    }

    /// Values of one feature restricted to `rows`, in row order.
    pub fn column(&self, feature: usize, rows: &[usize]) -> Vec<f64> {
        rows.iter().map(|&r| self.x[(r, feature)]).collect()
    }
}

/// Running per-arm totals over a set of rows.
///
/// Holds enough to compute the average treatment effect and to check the
/// leaf-size constraint without revisiting the rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArmStats {
    pub treated_count: usize,
    pub treated_sum: f64,
    pub control_count: usize,
    pub control_sum: f64,
}

impl ArmStats {
    pub fn from_rows(data: &TrainingSet<'_>, rows: &[usize]) -> Self {
        let mut stats = Self::default();
        for &r in rows {
            stats.push(data.is_treated(r), data.outcome(r));
        }
        stats
    }

    pub fn push(&mut self, treated: bool, y: f64) {
        if treated {
            self.treated_count += 1;
            self.treated_sum += y;
        } else {
            self.control_count += 1;
            self.control_sum += y;
        }
    }

    pub fn sample_count(&self) -> usize {
        self.treated_count + self.control_count
    }

    /// `mean(y | treated) - mean(y | control)`, or `None` when either arm is empty.
    pub fn effect(&self) -> Option<f64> {
        if self.treated_count == 0 || self.control_count == 0 {
            return None;
        }
        let treated_mean = self.treated_sum / self.treated_count as f64;
        let control_mean = self.control_sum / self.control_count as f64;
        Some(treated_mean - control_mean)
    }
}

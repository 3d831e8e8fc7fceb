//! Candidate split thresholds for one feature column.
//!
//! Instead of trying every distinct value, each feature contributes at most a
//! handful of percentile cut points. This keeps split search cost independent
//! of the number of rows while still following the column's distribution.
//!
//! - more than 10 distinct values: 11 fixed percentiles of the raw column
//! - otherwise: the 10th/50th/90th percentiles of the distinct values
//!
//! Changing either list or the cutoff changes the fitted trees.

/// Distinct-value count above which the raw column percentiles are used.
pub const DISTINCT_CUTOFF: usize = 10;

/// Percentiles of the raw column for high-cardinality features.
pub const RAW_PERCENTILES: [f64; 11] = [3.0, 5.0, 10.0, 20.0, 30.0, 50.0, 70.0, 80.0, 90.0, 95.0, 97.0];

/// Percentiles of the distinct-value set for low-cardinality features.
pub const DISTINCT_PERCENTILES: [f64; 3] = [10.0, 50.0, 90.0];

/// Ascending, deduplicated split thresholds for a column.
///
/// A column with fewer than two distinct values (including an empty column)
/// has no usable split and yields an empty list.
pub fn threshold_options(column: &[f64]) -> Vec<f64> {
    let mut sorted = column.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut distinct = sorted.clone();
    distinct.dedup();
    if distinct.len() < 2 {
        return Vec::new();
    }

    let mut out: Vec<f64> = if distinct.len() > DISTINCT_CUTOFF {
        RAW_PERCENTILES
            .iter()
            .map(|&q| percentile_sorted(&sorted, q))
            .collect()
    } else {
        DISTINCT_PERCENTILES
            .iter()
            .map(|&q| percentile_sorted(&distinct, q))
            .collect()
    };

    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

/// Percentile `q` (0..=100) of an ascending, non-empty slice.
///
/// Linear interpolation between the closest ranks at `q / 100 * (n - 1)`.
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = rank - lo as f64;

    let a = sorted[lo];
    let b = sorted[hi];
    // Interpolate from the nearer end; keeps results inside [a, b].
    if frac >= 0.5 {
        b - (b - a) * (1.0 - frac)
    } else {
        a + (b - a) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(percentile_sorted(&v, 0.0), 1.0);
        assert_abs_diff_eq!(percentile_sorted(&v, 50.0), 2.5);
        assert_abs_diff_eq!(percentile_sorted(&v, 100.0), 4.0);
        assert_abs_diff_eq!(percentile_sorted(&[7.0], 90.0), 7.0);
    }

    #[test]
    fn low_cardinality_uses_distinct_values() {
        // distinct = [1, 2, 3, 4, 5]; duplicates must not shift the percentiles.
        let column = [5.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 5.0];
        let t = threshold_options(&column);
        assert_eq!(t.len(), 3);
        assert_abs_diff_eq!(t[0], 1.4, epsilon = 1e-12);
        assert_abs_diff_eq!(t[1], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t[2], 4.6, epsilon = 1e-12);
    }

    #[test]
    fn high_cardinality_uses_raw_column() {
        let column: Vec<f64> = (0..2000).rev().map(|i| i as f64).collect();
        let t = threshold_options(&column);
        let expected = [
            59.97, 99.95, 199.9, 399.8, 599.7, 999.5, 1399.3, 1599.2, 1799.1, 1899.05, 1939.03,
        ];
        assert_eq!(t.len(), expected.len());
        for (got, want) in t.iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn duplicate_percentiles_collapse() {
        // 11 distinct values but heavily skewed: most raw percentiles hit 0.
        let mut column = vec![0.0; 1000];
        column.extend((1..=10).map(|i| i as f64));
        let t = threshold_options(&column);
        assert_eq!(t, vec![0.0]);
    }

    #[test]
    fn thresholds_are_sorted_and_unique() {
        let column: Vec<f64> = (0..50).map(|i| ((i * 37) % 23) as f64 * 0.5).collect();
        let t = threshold_options(&column);
        assert!(!t.is_empty());
        assert!(t.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn constant_or_empty_column_has_no_thresholds() {
        assert!(threshold_options(&[]).is_empty());
        assert!(threshold_options(&[3.0; 25]).is_empty());
    }

    #[test]
    fn two_distinct_values() {
        let t = threshold_options(&[0.0, 1.0, 0.0, 1.0]);
        assert_eq!(t.len(), 3);
        assert_abs_diff_eq!(t[0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(t[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(t[2], 0.9, epsilon = 1e-12);
    }
}

//! Reporting utilities: tree summaries, leaf segments and rankings.

pub mod format;

pub use format::*;

use crate::tree::{Branch, LeafInfo, Node, NodeStats, Split};

/// Shape and headline numbers of a fitted tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeSummary {
    pub depth: usize,
    pub n_nodes: usize,
    pub n_leaves: usize,
    pub root: NodeStats,
    pub min_leaf_effect: f64,
    pub max_leaf_effect: f64,
}

/// One leaf as a human-readable segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRow {
    /// Leaf number in left-to-right order.
    pub leaf: usize,
    pub depth: usize,
    /// Conjunction of the decisions leading here, e.g. `age <= 40 AND score > 0.5`.
    pub rule: String,
    pub stats: NodeStats,
}

/// Leaves with the strongest and weakest estimated effect (top-N each side).
#[derive(Debug, Clone)]
pub struct SegmentRankings {
    pub strongest: Vec<LeafRow>,
    pub weakest: Vec<LeafRow>,
}

pub fn summarize(root: &Node) -> TreeSummary {
    let leaves = root.leaves();
    let (min, max) = leaves.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), l| {
        (lo.min(l.stats.effect_estimate), hi.max(l.stats.effect_estimate))
    });

    TreeSummary {
        depth: root.depth(),
        n_nodes: root.n_nodes(),
        n_leaves: leaves.len(),
        root: *root.stats(),
        min_leaf_effect: min,
        max_leaf_effect: max,
    }
}

/// Describe every leaf with its decision rule, using `feature_names` for labels.
///
/// Features without a name fall back to `x{index}`.
pub fn leaf_rows(root: &Node, feature_names: &[String]) -> Vec<LeafRow> {
    root.leaves()
        .into_iter()
        .enumerate()
        .map(|(leaf, info)| LeafRow {
            leaf,
            depth: info.path.len(),
            rule: leaf_rule(&info, feature_names),
            stats: info.stats,
        })
        .collect()
}

/// Rank leaves by effect estimate.
pub fn rank_segments(rows: &[LeafRow], top_n: usize) -> SegmentRankings {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        b.stats
            .effect_estimate
            .partial_cmp(&a.stats.effect_estimate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let strongest = sorted.iter().take(top_n).cloned().collect();

    sorted.reverse();
    let weakest = sorted.iter().take(top_n).cloned().collect();

    SegmentRankings { strongest, weakest }
}

pub fn feature_label(feature: usize, feature_names: &[String]) -> String {
    feature_names
        .get(feature)
        .cloned()
        .unwrap_or_else(|| format!("x{feature}"))
}

pub fn condition(split: &Split, branch: Branch, feature_names: &[String]) -> String {
    let op = match branch {
        Branch::Left => "<=",
        Branch::Right => ">",
    };
    format!("{} {op} {}", feature_label(split.feature, feature_names), fmt_threshold(split.threshold))
}

fn leaf_rule(info: &LeafInfo, feature_names: &[String]) -> String {
    if info.path.is_empty() {
        return "(all)".to_string();
    }
    info.path
        .iter()
        .map(|(split, branch)| condition(split, *branch, feature_names))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn fmt_threshold(v: f64) -> String {
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" { "0".to_string() } else { s.to_string() }
}

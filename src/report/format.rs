//! Formatted terminal output.
//!
//! Formatting lives in one place so the fitting code stays clean and output
//! changes are localized.

use crate::domain::UpliftConfig;
use crate::tree::{Branch, Node};

use super::{LeafRow, SegmentRankings, TreeSummary, condition};

/// Dataset facts shown above the tree.
#[derive(Debug, Clone, Default)]
pub struct DatasetInfo {
    pub source: String,
    pub rows: usize,
    pub treated: usize,
    pub control: usize,
    pub feature_names: Vec<String>,
}

/// Format the run summary (dataset + config + tree shape).
pub fn format_fit_summary(data: &DatasetInfo, config: &UpliftConfig, summary: &TreeSummary) -> String {
    let mut out = String::new();

    out.push_str("=== uplift - Uplift Tree Fit ===\n");
    if !data.source.is_empty() {
        out.push_str(&format!("Data: {}\n", data.source));
    }
    out.push_str(&format!(
        "Rows: n={} | treated={} | control={}\n",
        data.rows, data.treated, data.control
    ));
    out.push_str(&format!("Features ({}): {}\n", data.feature_names.len(), data.feature_names.join(", ")));
    out.push_str(&format!(
        "Config: max_depth={} min_samples_leaf={} min_treated={} min_control={}\n",
        config.max_depth, config.min_samples_leaf, config.min_samples_leaf_treated, config.min_samples_leaf_control
    ));

    out.push_str("\nTree:\n");
    out.push_str(&format!(
        "- depth={} nodes={} leaves={}\n",
        summary.depth, summary.n_nodes, summary.n_leaves
    ));
    out.push_str(&format!("- root effect: {:.6}\n", summary.root.effect_estimate));
    out.push_str(&format!(
        "- leaf effects: [{:.6}, {:.6}]\n",
        summary.min_leaf_effect, summary.max_leaf_effect
    ));

    out
}

/// Render the tree as an indented outline, one node per line.
pub fn format_tree(root: &Node, feature_names: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&node_line(root, "root"));
    push_children(root, feature_names, 1, &mut out);
    out
}

fn push_children(node: &Node, feature_names: &[String], indent: usize, out: &mut String) {
    let (Some(split), Some((left, right))) = (node.split(), node.children()) else {
        return;
    };
    for (child, branch) in [(left, Branch::Left), (right, Branch::Right)] {
        out.push_str(&"  ".repeat(indent));
        out.push_str(&node_line(child, &condition(split, branch, feature_names)));
        push_children(child, feature_names, indent + 1, out);
    }
}

fn node_line(node: &Node, label: &str) -> String {
    let s = node.stats();
    format!(
        "[{label}] n={} (t={}, c={}) effect={:.6}{}\n",
        s.sample_count,
        s.treated_count,
        s.control_count,
        s.effect_estimate,
        if node.is_leaf() { " *" } else { "" }
    )
}

/// Format the strongest/weakest segment tables.
pub fn format_segments(rankings: &SegmentRankings) -> String {
    let mut out = String::new();

    out.push_str("Strongest segments:\n");
    out.push_str(&format_table(&rankings.strongest));
    out.push('\n');

    out.push_str("Weakest segments:\n");
    out.push_str(&format_table(&rankings.weakest));

    out
}

fn format_table(rows: &[LeafRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>5} {:>8} {:>8} {:>8} {:>12}  {}\n", "leaf", "n", "treated", "control", "effect", "rule"));
    out.push_str(&format!("{:-<5} {:-<8} {:-<8} {:-<8} {:-<12}  {:-<4}\n", "", "", "", "", "", ""));

    for r in rows {
        out.push_str(&format!(
            "{:>5} {:>8} {:>8} {:>8} {:>12.6}  {}\n",
            r.leaf,
            r.stats.sample_count,
            r.stats.treated_count,
            r.stats.control_count,
            r.stats.effect_estimate,
            truncate(&r.rule, 80),
        ));
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{leaf_rows, rank_segments, summarize};
    use crate::tree::{NodeStats, Split};

    fn stats(n: usize, effect: f64) -> NodeStats {
        NodeStats {
            sample_count: n,
            treated_count: n / 2,
            control_count: n - n / 2,
            effect_estimate: effect,
        }
    }

    fn tree() -> Node {
        Node::internal(
            stats(2000, 5.0),
            Split { feature: 0, threshold: 399.8 },
            Node::leaf(stats(400, 0.0)),
            Node::leaf(stats(1600, 10.0)),
        )
    }

    #[test]
    fn tree_outline_indents_children() {
        let names = vec!["x".to_string()];
        let text = format_tree(&tree(), &names);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[root] n=2000"));
        assert!(lines[1].starts_with("  [x <= 399.8] n=400"));
        assert!(lines[2].starts_with("  [x > 399.8] n=1600"));
        assert!(lines[2].ends_with('*'));
    }

    #[test]
    fn summary_mentions_shape() {
        let data = DatasetInfo {
            source: "demo.csv".to_string(),
            rows: 2000,
            treated: 1000,
            control: 1000,
            feature_names: vec!["x".to_string()],
        };
        let text = format_fit_summary(&data, &UpliftConfig::default(), &summarize(&tree()));
        assert!(text.contains("Data: demo.csv"));
        assert!(text.contains("depth=1 nodes=3 leaves=2"));
        assert!(text.contains("root effect: 5.000000"));
    }

    #[test]
    fn segment_tables_list_rows() {
        let rows = leaf_rows(&tree(), &[]);
        let text = format_segments(&rank_segments(&rows, 2));
        assert!(text.contains("Strongest segments:"));
        assert!(text.contains("x0 > 399.8"));
    }

    #[test]
    fn truncate_long_rules() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}

//! Fitted tree nodes and root-to-leaf traversal.
//!
//! A node is either a `Leaf` or an `Internal` decision node. Split fields only
//! exist on `Internal`, together with both children, so "has a split" and "has
//! children" cannot disagree.

use crate::domain::ArmStats;

/// Per-node training statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStats {
    /// Training rows routed to this node.
    pub sample_count: usize,
    pub treated_count: usize,
    pub control_count: usize,
    /// Average treatment effect over the rows routed here.
    pub effect_estimate: f64,
}

impl NodeStats {
    /// Build node statistics from per-arm totals.
    ///
    /// Returns `None` when one arm is empty, since the effect is undefined then.
    pub fn from_arms(arms: &ArmStats) -> Option<Self> {
        Some(Self {
            sample_count: arms.sample_count(),
            treated_count: arms.treated_count,
            control_count: arms.control_count,
            effect_estimate: arms.effect()?,
        })
    }
}

/// A `(feature, threshold)` decision. Rows with `value <= threshold` go left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub feature: usize,
    pub threshold: f64,
}

impl Split {
    pub fn goes_left(&self, value: f64) -> bool {
        value <= self.threshold
    }
}

/// Which child a row was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf {
        stats: NodeStats,
    },
    Internal {
        stats: NodeStats,
        split: Split,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn leaf(stats: NodeStats) -> Self {
        Node::Leaf { stats }
    }

    pub fn internal(stats: NodeStats, split: Split, left: Node, right: Node) -> Self {
        Node::Internal {
            stats,
            split,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn stats(&self) -> &NodeStats {
        match self {
            Node::Leaf { stats } | Node::Internal { stats, .. } => stats,
        }
    }

    pub fn effect_estimate(&self) -> f64 {
        self.stats().effect_estimate
    }

    pub fn sample_count(&self) -> usize {
        self.stats().sample_count
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn split(&self) -> Option<&Split> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { split, .. } => Some(split),
        }
    }

    pub fn children(&self) -> Option<(&Node, &Node)> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { left, right, .. } => Some((&**left, &**right)),
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self.children() {
            None => 0,
            Some((left, right)) => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_nodes(&self) -> usize {
        match self.children() {
            None => 1,
            Some((left, right)) => 1 + left.n_nodes() + right.n_nodes(),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self.children() {
            None => 1,
            Some((left, right)) => left.n_leaves() + right.n_leaves(),
        }
    }

    /// Walk from this node to a leaf, reading feature values through `value`.
    ///
    /// Values are not validated: a NaN compares false and is routed right.
    pub fn leaf_for(&self, value: impl Fn(usize) -> f64) -> &Node {
        let mut node = self;
        while let Node::Internal { split, left, right, .. } = node {
            node = if split.goes_left(value(split.feature)) { &**left } else { &**right };
        }
        node
    }

    /// The branches taken from this node to the leaf reached by `row`.
    pub fn decision_path(&self, row: &[f64]) -> Vec<Branch> {
        let mut path = Vec::new();
        let mut node = self;
        while let Node::Internal { split, left, right, .. } = node {
            if split.goes_left(row[split.feature]) {
                path.push(Branch::Left);
                node = &**left;
            } else {
                path.push(Branch::Right);
                node = &**right;
            }
        }
        path
    }

    /// All leaves in left-to-right order, each with the decisions leading to it.
    pub fn leaves(&self) -> Vec<LeafInfo> {
        let mut out = Vec::with_capacity(self.n_leaves());
        let mut path = Vec::new();
        collect_leaves(self, &mut path, &mut out);
        out
    }
}

/// A leaf together with its route from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafInfo {
    pub path: Vec<(Split, Branch)>,
    pub stats: NodeStats,
}

fn collect_leaves(node: &Node, path: &mut Vec<(Split, Branch)>, out: &mut Vec<LeafInfo>) {
    match node {
        Node::Leaf { stats } => out.push(LeafInfo {
            path: path.clone(),
            stats: *stats,
        }),
        Node::Internal { split, left, right, .. } => {
            path.push((*split, Branch::Left));
            collect_leaves(left, path, out);
            path.pop();

            path.push((*split, Branch::Right));
            collect_leaves(right, path, out);
            path.pop();
        }
    }
}

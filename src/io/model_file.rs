//! Read/write model JSON files.
//!
//! A model file is the portable form of a fitted regressor:
//! - growth configuration
//! - feature count and names (names select CSV columns at predict time)
//! - the tree as a flat node list
//!
//! Nodes are stored in pre-order with the root at index 0. Internal nodes
//! reference their children by index, and a child always comes after its
//! parent, which rules out cycles and self references on load.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UpliftConfig;
use crate::error::{AppError, UpliftError};
use crate::model::UpliftTreeRegressor;
use crate::tree::{Node, NodeStats, Split};

pub const TOOL_NAME: &str = "uplift";

/// Format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// One tree node in a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode {
    pub sample_count: usize,
    pub treated_count: usize,
    pub control_count: usize,
    pub effect_estimate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_feature: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<usize>,
}

/// A saved model file (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub version: u32,
    pub fitted_at: DateTime<Utc>,
    pub config: UpliftConfig,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub nodes: Vec<FlatNode>,
}

impl ModelFile {
    /// Capture a fitted model. Fails with `NotFitted` for an unfitted one.
    pub fn from_model(model: &UpliftTreeRegressor, feature_names: &[String]) -> Result<Self, UpliftError> {
        let (Some(root), Some(n_features)) = (model.tree(), model.n_features()) else {
            return Err(UpliftError::NotFitted);
        };
        if feature_names.len() != n_features {
            return Err(UpliftError::FeatureCountMismatch {
                expected: n_features,
                got: feature_names.len(),
            });
        }

        Ok(Self {
            tool: TOOL_NAME.to_string(),
            version: FORMAT_VERSION,
            fitted_at: Utc::now(),
            config: *model.config(),
            n_features,
            feature_names: feature_names.to_vec(),
            nodes: flatten(root),
        })
    }

    /// Rebuild the fitted regressor, validating the node list.
    pub fn to_model(&self) -> Result<UpliftTreeRegressor, UpliftError> {
        if self.version != FORMAT_VERSION {
            return Err(UpliftError::InvalidModel(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.version
            )));
        }
        if self.feature_names.len() != self.n_features {
            return Err(UpliftError::InvalidModel(format!(
                "{} feature names for {} features",
                self.feature_names.len(),
                self.n_features
            )));
        }
        let root = unflatten(&self.nodes)?;
        UpliftTreeRegressor::from_tree(self.config, self.n_features, root)
    }
}

/// Flatten a tree into pre-order nodes.
pub fn flatten(root: &Node) -> Vec<FlatNode> {
    let mut out = Vec::with_capacity(root.n_nodes());
    push_flat(root, &mut out);
    out
}

fn push_flat(node: &Node, out: &mut Vec<FlatNode>) -> usize {
    let idx = out.len();
    let stats = node.stats();
    out.push(FlatNode {
        sample_count: stats.sample_count,
        treated_count: stats.treated_count,
        control_count: stats.control_count,
        effect_estimate: stats.effect_estimate,
        split_feature: None,
        split_threshold: None,
        left: None,
        right: None,
    });

    if let (Some(split), Some((left, right))) = (node.split(), node.children()) {
        let left_idx = push_flat(left, out);
        let right_idx = push_flat(right, out);
        let flat = &mut out[idx];
        flat.split_feature = Some(split.feature);
        flat.split_threshold = Some(split.threshold);
        flat.left = Some(left_idx);
        flat.right = Some(right_idx);
    }
    idx
}

/// Rebuild a tree from a flat node list.
///
/// Rejects empty lists, out-of-range or backward child indices, nodes that are
/// reached twice or never, and split fields without children (or vice versa).
pub fn unflatten(nodes: &[FlatNode]) -> Result<Node, UpliftError> {
    if nodes.is_empty() {
        return Err(UpliftError::InvalidModel("tree has no nodes".to_string()));
    }
    let mut visited = vec![false; nodes.len()];
    let root = build_node(nodes, 0, &mut visited)?;

    if let Some(idx) = visited.iter().position(|v| !v) {
        return Err(UpliftError::InvalidModel(format!("node {idx} is unreachable from the root")));
    }
    Ok(root)
}

fn build_node(nodes: &[FlatNode], idx: usize, visited: &mut [bool]) -> Result<Node, UpliftError> {
    if visited[idx] {
        return Err(UpliftError::InvalidModel(format!("node {idx} is reached more than once")));
    }
    visited[idx] = true;

    let flat = &nodes[idx];
    let stats = NodeStats {
        sample_count: flat.sample_count,
        treated_count: flat.treated_count,
        control_count: flat.control_count,
        effect_estimate: flat.effect_estimate,
    };

    match (flat.split_feature, flat.split_threshold, flat.left, flat.right) {
        (None, None, None, None) => Ok(Node::leaf(stats)),
        (Some(feature), Some(threshold), Some(left), Some(right)) => {
            for child in [left, right] {
                if child <= idx || child >= nodes.len() {
                    return Err(UpliftError::InvalidModel(format!(
                        "node {idx} has invalid child index {child} ({} nodes)",
                        nodes.len()
                    )));
                }
            }
            let left = build_node(nodes, left, visited)?;
            let right = build_node(nodes, right, visited)?;
            Ok(Node::internal(stats, Split { feature, threshold }, left, right))
        }
        _ => Err(UpliftError::InvalidModel(format!(
            "node {idx} must have either all of split_feature/split_threshold/left/right or none"
        ))),
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, model)
        .map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;

    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;
    Ok(model)
}

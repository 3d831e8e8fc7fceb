//! Tree fitting.
//!
//! Responsibilities:
//!
//! - propose percentile thresholds per feature (`thresholds`)
//! - score constrained `(feature, threshold)` candidates for a node (`split`)
//! - grow the tree recursively up to `max_depth` (`builder`)

pub mod builder;
pub mod split;
pub mod thresholds;

pub use builder::*;
pub use split::*;
pub use thresholds::*;

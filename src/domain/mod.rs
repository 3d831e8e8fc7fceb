//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - growth configuration (`UpliftConfig`)
//! - the validated training view (`TrainingSet`)
//! - per-arm running totals (`ArmStats`)

pub mod types;

pub use types::*;

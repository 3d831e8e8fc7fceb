//! `uplift-tree` library crate.
//!
//! The binary (`uplift`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the regressor can be embedded directly (`model::UpliftTreeRegressor`)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod model;
pub mod report;
pub mod tree;

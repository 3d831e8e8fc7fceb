//! Model front-end: fit and predict over feature matrices.

pub mod regressor;

pub use regressor::*;

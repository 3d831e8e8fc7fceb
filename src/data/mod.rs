//! Data sources.
//!
//! - `sample`: seeded synthetic experiments with a known effect

pub mod sample;

pub use sample::*;

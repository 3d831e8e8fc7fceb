//! Uplift tree representation.
//!
//! The tree is a plain owned value: every child is boxed inside its parent,
//! there are no back references, and nothing is mutated after fitting.

pub mod node;

pub use node::*;

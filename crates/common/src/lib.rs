//! Shared value types for the Vantage renderer.
//!
//! Everything here is plain data with no GPU or windowing dependency, so
//! every other crate in the workspace can use these types freely.

mod types;

pub use types::{Transform, Vertex};

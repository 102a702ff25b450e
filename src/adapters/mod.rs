//! Adapters layer: Concrete implementations of ports.
//!
//! - `forest`: tree-ensemble artifact loader and `Classifier` implementation
//! - `sanitize`: clinical value and secret filtering for logs

pub mod forest;
pub mod sanitize;

pub use forest::{ArtifactLoadError, ForestClassifier, LoadPolicy};

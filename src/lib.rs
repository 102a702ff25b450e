//! # Heart Risk
//!
//! Heart disease risk prediction from clinical attributes.
//!
//! This crate provides:
//! - Feature engineering over a 13-attribute patient record
//! - A tree-ensemble classifier loaded from a (optionally signed) artifact
//! - Terminal UI form for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (PatientRecord, derived features, labels)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (forest artifact, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{PatientRecord, Prediction, RiskLabel};

/// Result type for Heart Risk operations
pub type Result<T> = std::result::Result<T, HeartRiskError>;

/// Main error type for Heart Risk
#[derive(Debug, thiserror::Error)]
pub enum HeartRiskError {
    #[error("Failed to load classifier artifact: {0}")]
    ArtifactLoad(#[from] adapters::ArtifactLoadError),

    #[error(transparent)]
    SchemaMismatch(#[from] domain::SchemaMismatchError),

    #[error(transparent)]
    Feature(#[from] domain::FeatureError),
}

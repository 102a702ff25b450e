//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use case of the application: predicting risk for one patient.

mod inference;

pub use inference::RiskPredictor;

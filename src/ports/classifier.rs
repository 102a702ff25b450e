//! Classifier port: Trait for scoring combined patient records.
//!
//! This trait abstracts the trained artifact from the application logic.

use crate::domain::{CombinedRecord, RiskLabel, SchemaMismatchError};

/// Trait for a loaded binary classifier.
///
/// Implementations are immutable once constructed and may be shared across
/// threads without locking.
pub trait Classifier: Send + Sync {
    /// Column names the artifact was trained with, in artifact order.
    fn feature_names(&self) -> Vec<&str>;

    /// Predict the class of a record.
    ///
    /// # Errors
    /// Returns [`SchemaMismatchError`] if the record's fields do not match
    /// the artifact's schema.
    fn classify(&self, record: &CombinedRecord) -> Result<RiskLabel, SchemaMismatchError>;

    /// Probability of the positive (high risk) class, in `[0, 1]`.
    ///
    /// # Errors
    /// Returns [`SchemaMismatchError`] if the record's fields do not match
    /// the artifact's schema.
    fn score(&self, record: &CombinedRecord) -> Result<f64, SchemaMismatchError>;
}

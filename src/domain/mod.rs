//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Everything here is deterministic and can be
//! exercised without an artifact or a terminal.

mod diagnosis;
mod features;
mod patient;
mod record;

pub use diagnosis::{ClassMetrics, InferenceResult, ModelEvaluation, Prediction, RiskLabel};
pub use features::{derive_features, DerivedFeatures, FeatureError, DERIVED_FEATURE_NAMES};
pub use patient::{
    ChestPainType, ExerciseAngina, FastingBloodSugar, PatientRecord, RestEcg, Sex, Slope,
    Thalassemia, VesselsColored,
};
pub use record::{
    CombinedRecord, Field, FieldKind, FieldValue, SchemaMismatchError, COMBINED_FEATURE_COUNT,
    RAW_FEATURE_NAMES,
};

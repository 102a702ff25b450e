//! Combined feature record handed to the classifier.
//!
//! A [`CombinedRecord`] is the named 18-column snapshot (13 raw attributes plus
//! 5 derived features) the artifact was trained on. It is built once per
//! prediction and only ever borrowed afterwards, so `classify` and `score`
//! always see the same values.

use super::features::{derive_features, DerivedFeatures, FeatureError, DERIVED_FEATURE_NAMES};
use super::patient::PatientRecord;

/// Raw attribute column names, in training order.
pub const RAW_FEATURE_NAMES: [&str; 13] = [
    "age",
    "sex",
    "chest_pain_type",
    "resting_blood_pressure",
    "cholestoral",
    "fasting_blood_sugar",
    "rest_ecg",
    "Max_heart_rate",
    "exercise_induced_angina",
    "oldpeak",
    "slope",
    "vessels_colored_by_flourosopy",
    "thalassemia",
];

/// Total number of columns in a combined record.
pub const COMBINED_FEATURE_COUNT: usize = RAW_FEATURE_NAMES.len() + DERIVED_FEATURE_NAMES.len();

/// Value of a single column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Number(f64),
    /// Categorical label, encoded by the artifact.
    Category(&'static str),
}

impl FieldValue {
    /// Whether this value is numeric or categorical.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Number(_) => FieldKind::Numeric,
            Self::Category(_) => FieldKind::Categorical,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Category(label) => write!(f, "{label:?}"),
        }
    }
}

/// Whether a column holds a number or a categorical label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Categorical,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Categorical => write!(f, "categorical"),
        }
    }
}

/// A named column of a combined record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

/// Disagreement between a record and the columns the artifact expects.
///
/// Always indicates version skew between this code and the artifact; callers
/// must surface it rather than fall back to a guess.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaMismatchError {
    #[error("Schema mismatch: artifact expects field {0:?} which the record lacks")]
    MissingField(String),

    #[error("Schema mismatch: record field {0:?} is unknown to the artifact")]
    UnexpectedField(String),

    #[error("Schema mismatch: field {field:?} appears more than once")]
    DuplicateField { field: String },

    #[error("Schema mismatch: field {field:?} should be {expected}, got {actual}")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        actual: FieldKind,
    },

    #[error("Schema mismatch: field {field:?} has category {value:?} unknown to the artifact")]
    UnknownCategory { field: String, value: String },
}

/// Immutable 13 + 5 column snapshot of one patient.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    fields: Vec<Field>,
}

impl CombinedRecord {
    /// Derive features and assemble the combined record.
    ///
    /// # Errors
    /// Propagates [`FeatureError`] from the feature deriver.
    pub fn from_patient(patient: &PatientRecord) -> Result<Self, FeatureError> {
        let derived = derive_features(patient)?;
        Ok(Self::assemble(patient, &derived))
    }

    /// Assemble from a patient and its already-derived features.
    #[must_use]
    pub fn assemble(patient: &PatientRecord, derived: &DerivedFeatures) -> Self {
        use FieldValue::{Category, Number};

        let raw = [
            Number(f64::from(patient.age)),
            Category(patient.sex.label()),
            Category(patient.chest_pain_type.label()),
            Number(f64::from(patient.resting_blood_pressure)),
            Number(f64::from(patient.cholestoral)),
            Category(patient.fasting_blood_sugar.label()),
            Category(patient.rest_ecg.label()),
            Number(f64::from(patient.max_heart_rate)),
            Category(patient.exercise_induced_angina.label()),
            Number(patient.oldpeak),
            Category(patient.slope.label()),
            Category(patient.vessels_colored_by_flourosopy.label()),
            Category(patient.thalassemia.label()),
        ];

        let mut fields = Vec::with_capacity(COMBINED_FEATURE_COUNT);
        fields.extend(
            RAW_FEATURE_NAMES
                .into_iter()
                .zip(raw)
                .map(|(name, value)| Field { name, value }),
        );
        fields.extend(derived.named().map(|(name, v)| Field {
            name,
            value: Number(v),
        }));

        Self { fields }
    }

    /// Build a record from arbitrary fields.
    ///
    /// Used by callers that carry their own column set; the classifier still
    /// checks it against the artifact schema.
    #[must_use]
    pub fn from_fields(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// All columns in order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a column by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::{ExerciseAngina, Thalassemia};

    #[test]
    fn test_record_has_all_columns_in_training_order() {
        let record = CombinedRecord::from_patient(&PatientRecord::default()).expect("valid");
        assert_eq!(record.len(), COMBINED_FEATURE_COUNT);
        assert_eq!(record.len(), 18);

        let names: Vec<&str> = record.fields().iter().map(|f| f.name).collect();
        let expected: Vec<&str> = RAW_FEATURE_NAMES
            .iter()
            .chain(DERIVED_FEATURE_NAMES.iter())
            .copied()
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_categoricals_carry_labels() {
        let patient = PatientRecord {
            thalassemia: Thalassemia::FixedDefect,
            exercise_induced_angina: ExerciseAngina::No,
            ..PatientRecord::default()
        };
        let record = CombinedRecord::from_patient(&patient).expect("valid");
        assert_eq!(record.get("thalassemia"), Some(FieldValue::Category("Fixed defect")));
        assert_eq!(record.get("exercise_induced_angina"), Some(FieldValue::Category("No")));
        assert_eq!(record.get("Max_heart_rate"), Some(FieldValue::Number(150.0)));
    }

    #[test]
    fn test_derived_columns_present() {
        let record = CombinedRecord::from_patient(&PatientRecord::default()).expect("valid");
        assert_eq!(record.get("cholesterol_per_age"), Some(FieldValue::Number(4.0)));
        assert_eq!(
            record.get("bp_cholesterol_interaction"),
            Some(FieldValue::Number(24000.0))
        );
    }

    #[test]
    fn test_zero_age_fails_before_record_exists() {
        let patient = PatientRecord {
            age: 0,
            ..PatientRecord::default()
        };
        assert!(matches!(
            CombinedRecord::from_patient(&patient),
            Err(FeatureError::DivisionByZero { age: 0 })
        ));
    }
}

//! Risk prediction service: Orchestrates one end-to-end prediction.
//!
//! For each patient record the service:
//! - derives the engineered features,
//! - assembles one immutable combined record,
//! - asks the classifier for a label and a positive-class probability on that
//!   same record.

use std::sync::Arc;

use crate::domain::{
    CombinedRecord, InferenceResult, PatientRecord, Prediction, SchemaMismatchError,
    DERIVED_FEATURE_NAMES, RAW_FEATURE_NAMES,
};
use crate::ports::Classifier;

/// Service turning patient records into risk predictions.
///
/// The classifier is injected and shared; the service holds no other state,
/// so predictions are independent of each other.
pub struct RiskPredictor<C: Classifier> {
    classifier: Arc<C>,
}

impl<C: Classifier> RiskPredictor<C> {
    /// Create a predictor over an already-loaded classifier.
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    /// The classifier this predictor uses.
    #[must_use]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Check the classifier consumes exactly the fields a combined record
    /// carries, so a stale artifact fails at startup rather than on the first
    /// prediction.
    ///
    /// # Errors
    /// [`SchemaMismatchError::MissingField`] for an artifact input no record
    /// provides, [`SchemaMismatchError::UnexpectedField`] for a record field
    /// the artifact does not consume.
    pub fn check_schema(&self) -> Result<(), SchemaMismatchError> {
        let consumed = self.classifier.feature_names();
        let provided: Vec<&str> = RAW_FEATURE_NAMES
            .iter()
            .chain(DERIVED_FEATURE_NAMES.iter())
            .copied()
            .collect();

        if let Some(name) = consumed.iter().find(|n| !provided.contains(*n)) {
            return Err(SchemaMismatchError::MissingField((*name).to_string()));
        }
        if let Some(name) = provided.iter().find(|n| !consumed.contains(*n)) {
            return Err(SchemaMismatchError::UnexpectedField((*name).to_string()));
        }
        Ok(())
    }

    /// Predict heart disease risk for one patient.
    ///
    /// # Errors
    /// Returns [`crate::HeartRiskError::Feature`] if features cannot be
    /// derived, or [`crate::HeartRiskError::SchemaMismatch`] if the combined
    /// record does not fit the classifier's artifact.
    pub fn predict(&self, patient: &PatientRecord) -> crate::Result<Prediction> {
        let derived = crate::domain::derive_features(patient)?;
        let record = CombinedRecord::assemble(patient, &derived);

        let label = self.classifier.classify(&record)?;
        let probability = self.classifier.score(&record)?;

        tracing::info!(
            "Prediction complete: label={}, probability={:.4}",
            label,
            probability
        );

        Ok(Prediction {
            derived,
            result: InferenceResult { label, probability },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ForestClassifier, LoadPolicy};
    use crate::domain::{
        ChestPainType, ExerciseAngina, FeatureError, RiskLabel, SchemaMismatchError, Thalassemia,
        VesselsColored,
    };
    use crate::HeartRiskError;
    use std::path::Path;
    use std::sync::Mutex;

    /// Classifier double that records every record it is handed.
    struct RecordingClassifier {
        seen: Mutex<Vec<CombinedRecord>>,
        result: Result<(RiskLabel, f64), SchemaMismatchError>,
        names: Vec<&'static str>,
    }

    fn record_names() -> Vec<&'static str> {
        RAW_FEATURE_NAMES
            .iter()
            .chain(DERIVED_FEATURE_NAMES.iter())
            .copied()
            .collect()
    }

    impl RecordingClassifier {
        fn returning(label: RiskLabel, probability: f64) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                result: Ok((label, probability)),
                names: record_names(),
            }
        }

        fn failing(err: SchemaMismatchError) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                result: Err(err),
                names: record_names(),
            }
        }
    }

    impl Classifier for RecordingClassifier {
        fn feature_names(&self) -> Vec<&str> {
            self.names.clone()
        }

        fn classify(&self, record: &CombinedRecord) -> Result<RiskLabel, SchemaMismatchError> {
            self.seen.lock().unwrap().push(record.clone());
            self.result.clone().map(|(label, _)| label)
        }

        fn score(&self, record: &CombinedRecord) -> Result<f64, SchemaMismatchError> {
            self.seen.lock().unwrap().push(record.clone());
            self.result.clone().map(|(_, p)| p)
        }
    }

    fn create_test_predictor() -> RiskPredictor<ForestClassifier> {
        let forest = ForestClassifier::load(Path::new("models"), &LoadPolicy::allow_unsigned())
            .expect("Model should load for tests");
        RiskPredictor::new(Arc::new(forest))
    }

    #[test]
    fn test_classify_and_score_see_the_same_record() {
        let classifier = Arc::new(RecordingClassifier::returning(RiskLabel::High, 0.9));
        let predictor = RiskPredictor::new(Arc::clone(&classifier));

        let prediction = predictor
            .predict(&PatientRecord::default())
            .expect("should predict");
        assert_eq!(prediction.result.label, RiskLabel::High);
        assert_eq!(prediction.result.probability, 0.9);

        let seen = classifier.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn test_derived_features_are_returned() {
        let classifier = Arc::new(RecordingClassifier::returning(RiskLabel::Low, 0.1));
        let predictor = RiskPredictor::new(classifier);

        let patient = PatientRecord {
            exercise_induced_angina: ExerciseAngina::No,
            ..PatientRecord::default()
        };
        let prediction = predictor.predict(&patient).expect("should predict");
        assert_eq!(prediction.derived.cholesterol_per_age, 4.0);
        assert_eq!(prediction.derived.hr_age_ratio, 3.0);
        assert_eq!(prediction.derived.bp_cholesterol_interaction, 24000.0);
        assert_eq!(prediction.derived.ex_induced_pain_severity, 0.0);
        assert_eq!(prediction.derived.heart_stress_score, 321.0);
    }

    #[test]
    fn test_zero_age_never_reaches_classifier() {
        let classifier = Arc::new(RecordingClassifier::returning(RiskLabel::Low, 0.1));
        let predictor = RiskPredictor::new(Arc::clone(&classifier));

        let patient = PatientRecord {
            age: 0,
            ..PatientRecord::default()
        };
        let err = predictor.predict(&patient).expect_err("age 0 is invalid");
        assert!(matches!(
            err,
            HeartRiskError::Feature(FeatureError::DivisionByZero { age: 0 })
        ));
        assert!(classifier.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_schema_mismatch_is_surfaced() {
        let classifier = Arc::new(RecordingClassifier::failing(
            SchemaMismatchError::MissingField("thalassemia".into()),
        ));
        let predictor = RiskPredictor::new(classifier);

        let err = predictor
            .predict(&PatientRecord::default())
            .expect_err("mismatch must not produce a prediction");
        assert!(matches!(err, HeartRiskError::SchemaMismatch(_)));
    }

    #[test]
    fn test_schema_check_accepts_matching_classifier() {
        assert_eq!(create_test_predictor().check_schema(), Ok(()));

        let classifier = RecordingClassifier::returning(RiskLabel::Low, 0.1);
        assert_eq!(RiskPredictor::new(Arc::new(classifier)).check_schema(), Ok(()));
    }

    #[test]
    fn test_schema_check_reports_skew() {
        let mut classifier = RecordingClassifier::returning(RiskLabel::Low, 0.1);
        classifier.names.retain(|n| *n != "heart_stress_score");
        assert_eq!(
            RiskPredictor::new(Arc::new(classifier)).check_schema(),
            Err(SchemaMismatchError::UnexpectedField("heart_stress_score".into()))
        );

        let mut classifier = RecordingClassifier::returning(RiskLabel::Low, 0.1);
        classifier.names.push("smoker");
        assert_eq!(
            RiskPredictor::new(Arc::new(classifier)).check_schema(),
            Err(SchemaMismatchError::MissingField("smoker".into()))
        );
    }

    #[test]
    fn test_inference_pipeline_with_shipped_artifact() {
        let predictor = create_test_predictor();

        let low = predictor
            .predict(&PatientRecord {
                exercise_induced_angina: ExerciseAngina::No,
                ..PatientRecord::default()
            })
            .expect("Should run inference");
        assert_eq!(low.result.label, RiskLabel::Low);
        assert_eq!(low.result.probability_percent(), "20.00%");

        let high = predictor
            .predict(&PatientRecord {
                chest_pain_type: ChestPainType::Asymptomatic,
                oldpeak: 2.5,
                vessels_colored_by_flourosopy: VesselsColored::Two,
                thalassemia: Thalassemia::ReversibleDefect,
                ..PatientRecord::default()
            })
            .expect("Should run inference");
        assert_eq!(high.result.label, RiskLabel::High);
        assert!(high.result.probability > 0.5 && high.result.probability <= 1.0);
    }

    #[test]
    fn test_label_agrees_with_probability() {
        let predictor = create_test_predictor();
        for age in [20, 45, 70, 100] {
            for chol in [100, 250, 600] {
                let patient = PatientRecord {
                    age,
                    cholestoral: chol,
                    ..PatientRecord::default()
                };
                let p = predictor.predict(&patient).expect("Should run inference");
                assert_eq!(p.result.label == RiskLabel::High, p.result.probability > 0.5);
            }
        }
    }
}

//! Engineered features derived from the raw patient attributes.

use serde::{Deserialize, Serialize};

use super::patient::{ExerciseAngina, PatientRecord};

/// Names of the derived columns, in the order they were appended at training.
pub const DERIVED_FEATURE_NAMES: [&str; 5] = [
    "cholesterol_per_age",
    "hr_age_ratio",
    "bp_cholesterol_interaction",
    "ex_induced_pain_severity",
    "heart_stress_score",
];

/// Errors raised while deriving features.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    /// Age is used as a divisor and must be strictly positive.
    #[error("Division by zero: age must be positive to derive per-age ratios (got {age})")]
    DivisionByZero { age: i32 },
}

/// The five engineered features, recomputed for every record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    /// cholestoral / age
    pub cholesterol_per_age: f64,
    /// Max_heart_rate / age
    pub hr_age_ratio: f64,
    /// resting_blood_pressure * cholestoral
    pub bp_cholesterol_interaction: f64,
    /// oldpeak when exercise-induced angina is present, else 0
    pub ex_induced_pain_severity: f64,
    /// resting_blood_pressure + cholestoral + oldpeak
    pub heart_stress_score: f64,
}

impl DerivedFeatures {
    /// Values in [`DERIVED_FEATURE_NAMES`] order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.cholesterol_per_age,
            self.hr_age_ratio,
            self.bp_cholesterol_interaction,
            self.ex_induced_pain_severity,
            self.heart_stress_score,
        ]
    }

    /// `(name, value)` pairs in [`DERIVED_FEATURE_NAMES`] order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        DERIVED_FEATURE_NAMES.into_iter().zip(self.to_vec())
    }
}

/// Derive the engineered features for a patient.
///
/// # Errors
/// Returns [`FeatureError::DivisionByZero`] if `age <= 0`. The form never
/// produces such a record, but other callers can.
pub fn derive_features(patient: &PatientRecord) -> Result<DerivedFeatures, FeatureError> {
    if patient.age <= 0 {
        return Err(FeatureError::DivisionByZero { age: patient.age });
    }

    let age = f64::from(patient.age);
    let bp = f64::from(patient.resting_blood_pressure);
    let chol = f64::from(patient.cholestoral);
    let angina = match patient.exercise_induced_angina {
        ExerciseAngina::Yes => 1.0,
        ExerciseAngina::No => 0.0,
    };

    Ok(DerivedFeatures {
        cholesterol_per_age: chol / age,
        hr_age_ratio: f64::from(patient.max_heart_rate) / age,
        bp_cholesterol_interaction: bp * chol,
        ex_induced_pain_severity: angina * patient.oldpeak,
        heart_stress_score: bp + chol + patient.oldpeak,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::{
        ChestPainType, FastingBloodSugar, RestEcg, Sex, Slope, Thalassemia, VesselsColored,
    };

    fn reference_patient() -> PatientRecord {
        PatientRecord {
            age: 50,
            sex: Sex::Male,
            chest_pain_type: ChestPainType::TypicalAngina,
            resting_blood_pressure: 120,
            cholestoral: 200,
            fasting_blood_sugar: FastingBloodSugar::Below120,
            rest_ecg: RestEcg::Normal,
            max_heart_rate: 150,
            exercise_induced_angina: ExerciseAngina::No,
            oldpeak: 1.0,
            slope: Slope::Upsloping,
            vessels_colored_by_flourosopy: VesselsColored::Zero,
            thalassemia: Thalassemia::Normal,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_patient() {
        let d = derive_features(&reference_patient()).expect("valid age");
        assert!(close(d.cholesterol_per_age, 4.0));
        assert!(close(d.hr_age_ratio, 3.0));
        assert!(close(d.bp_cholesterol_interaction, 24000.0));
        assert!(close(d.ex_induced_pain_severity, 0.0));
        assert!(close(d.heart_stress_score, 321.0));
    }

    #[test]
    fn test_cholesterol_per_age_matches_division() {
        for age in [20, 37, 50, 73, 100] {
            for chol in [100, 245, 600] {
                let p = PatientRecord {
                    age,
                    cholestoral: chol,
                    ..reference_patient()
                };
                let d = derive_features(&p).expect("valid age");
                assert!(close(d.cholesterol_per_age, f64::from(chol) / f64::from(age)));
            }
        }
    }

    #[test]
    fn test_minimum_age_maximum_cholesterol() {
        let p = PatientRecord {
            age: 20,
            cholestoral: 600,
            ..reference_patient()
        };
        let d = derive_features(&p).expect("age 20 is valid");
        assert!(close(d.cholesterol_per_age, 30.0));
        assert!(d.hr_age_ratio.is_finite());
    }

    #[test]
    fn test_no_angina_zeroes_pain_severity() {
        for oldpeak in [0.0, 0.1, 2.5, 6.0] {
            let p = PatientRecord {
                exercise_induced_angina: ExerciseAngina::No,
                oldpeak,
                ..reference_patient()
            };
            let d = derive_features(&p).expect("valid age");
            assert_eq!(d.ex_induced_pain_severity, 0.0);
        }
    }

    #[test]
    fn test_angina_scales_pain_severity_by_oldpeak() {
        let p = PatientRecord {
            exercise_induced_angina: ExerciseAngina::Yes,
            oldpeak: 2.3,
            ..reference_patient()
        };
        let d = derive_features(&p).expect("valid age");
        assert!(close(d.ex_induced_pain_severity, 2.3));
    }

    #[test]
    fn test_heart_stress_score_increases_in_each_input() {
        let base = derive_features(&reference_patient()).expect("valid age").heart_stress_score;

        let bumped = [
            PatientRecord {
                resting_blood_pressure: 121,
                ..reference_patient()
            },
            PatientRecord {
                cholestoral: 201,
                ..reference_patient()
            },
            PatientRecord {
                oldpeak: 1.1,
                ..reference_patient()
            },
        ];

        for p in bumped {
            let score = derive_features(&p).expect("valid age").heart_stress_score;
            assert!(score > base, "{score} should exceed {base}");
        }
    }

    #[test]
    fn test_zero_age_is_division_by_zero() {
        let p = PatientRecord {
            age: 0,
            ..reference_patient()
        };
        assert_eq!(derive_features(&p), Err(FeatureError::DivisionByZero { age: 0 }));
    }

    #[test]
    fn test_negative_age_is_rejected() {
        let p = PatientRecord {
            age: -4,
            ..reference_patient()
        };
        let err = derive_features(&p).expect_err("negative age");
        assert!(err.to_string().contains("-4"));
    }

    #[test]
    fn test_named_follows_declared_order() {
        let d = derive_features(&reference_patient()).expect("valid age");
        let names: Vec<&str> = d.named().map(|(n, _)| n).collect();
        assert_eq!(names, DERIVED_FEATURE_NAMES.to_vec());
    }
}

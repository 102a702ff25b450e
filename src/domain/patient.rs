//! Patient record types for heart disease risk prediction.
//!
//! Attribute names and categorical labels follow the UCI-style heart disease
//! dataset the classifier was trained on, including its original spellings
//! (`cholestoral`, `vessels_colored_by_flourosopy`, `Max_heart_rate`).

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Declares a closed categorical attribute.
///
/// Each variant carries the exact label shown in the form, which is also the
/// value the artifact's encoding table is keyed by.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// All variants, in form display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical label of this category.
            #[must_use]
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

categorical! {
    /// Biological sex.
    Sex {
        Male => "Male",
        Female => "Female",
    }
}

categorical! {
    /// Chest pain type (cp).
    ChestPainType {
        TypicalAngina => "Typical angina",
        AtypicalAngina => "Atypical angina",
        NonAnginalPain => "Non-anginal pain",
        Asymptomatic => "Asymptomatic",
    }
}

categorical! {
    /// Fasting blood sugar relative to 120 mg/ml (fbs).
    FastingBloodSugar {
        Above120 => "Greater than 120 mg/ml",
        Below120 => "Lower than 120 mg/ml",
    }
}

categorical! {
    /// Resting electrocardiographic result (restecg).
    RestEcg {
        Normal => "Normal",
        LeftVentricularHypertrophy => "Left ventricular hypertrophy",
        StTWaveAbnormality => "ST-T wave abnormality",
    }
}

categorical! {
    /// Exercise-induced angina (exang).
    ExerciseAngina {
        Yes => "Yes",
        No => "No",
    }
}

categorical! {
    /// Slope of the peak exercise ST segment.
    Slope {
        Upsloping => "Upsloping",
        Flat => "Flat",
        Downsloping => "Downsloping",
    }
}

categorical! {
    /// Number of major vessels colored by fluoroscopy (ca).
    ///
    /// Categorical in the training data, encoded as the strings "0".."3".
    VesselsColored {
        Zero => "0",
        One => "1",
        Two => "2",
        Three => "3",
    }
}

categorical! {
    /// Thalassemia test result (thal).
    Thalassemia {
        Normal => "Normal",
        FixedDefect => "Fixed defect",
        ReversibleDefect => "Reversible defect",
    }
}

/// Raw clinical attributes for one prediction request.
///
/// Created per form submission and dropped after the result is shown.
/// Range enforcement belongs to the form; integer fields are signed so that
/// out-of-domain values from other callers stay representable and can be
/// rejected downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: i32,
    pub sex: Sex,
    pub chest_pain_type: ChestPainType,
    /// Resting blood pressure in mm Hg
    pub resting_blood_pressure: i32,
    /// Serum cholesterol in mg/dl
    pub cholestoral: i32,
    pub fasting_blood_sugar: FastingBloodSugar,
    pub rest_ecg: RestEcg,
    /// Maximum heart rate achieved (bpm)
    #[serde(rename = "Max_heart_rate")]
    pub max_heart_rate: i32,
    pub exercise_induced_angina: ExerciseAngina,
    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,
    pub slope: Slope,
    pub vessels_colored_by_flourosopy: VesselsColored,
    pub thalassemia: Thalassemia,
}

impl PatientRecord {
    /// Domain of `age` accepted by the form.
    pub const AGE_RANGE: RangeInclusive<i32> = 20..=100;
    /// Domain of `resting_blood_pressure` accepted by the form.
    pub const RESTING_BP_RANGE: RangeInclusive<i32> = 80..=200;
    /// Domain of `cholestoral` accepted by the form.
    pub const CHOLESTEROL_RANGE: RangeInclusive<i32> = 100..=600;
    /// Domain of `max_heart_rate` accepted by the form.
    pub const MAX_HEART_RATE_RANGE: RangeInclusive<i32> = 60..=220;
    /// Domain of `oldpeak` accepted by the form.
    pub const OLDPEAK_RANGE: RangeInclusive<f64> = 0.0..=6.0;
    /// Form increment for `oldpeak`.
    pub const OLDPEAK_STEP: f64 = 0.1;
}

impl Default for PatientRecord {
    /// The form's initial values.
    fn default() -> Self {
        Self {
            age: 50,
            sex: Sex::Male,
            chest_pain_type: ChestPainType::TypicalAngina,
            resting_blood_pressure: 120,
            cholestoral: 200,
            fasting_blood_sugar: FastingBloodSugar::Above120,
            rest_ecg: RestEcg::Normal,
            max_heart_rate: 150,
            exercise_induced_angina: ExerciseAngina::Yes,
            oldpeak: 1.0,
            slope: Slope::Upsloping,
            vessels_colored_by_flourosopy: VesselsColored::Zero,
            thalassemia: Thalassemia::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_the_serialized_form() {
        for cp in ChestPainType::ALL {
            let json = serde_json::to_value(cp).expect("serialize");
            assert_eq!(json, serde_json::Value::from(cp.label()));
            assert_eq!(serde_json::from_value::<ChestPainType>(json).expect("parse"), *cp);
        }
        assert!(serde_json::from_value::<Sex>(serde_json::Value::from("male")).is_err());
    }

    #[test]
    fn test_vessels_are_string_categories() {
        let labels: Vec<&str> = VesselsColored::ALL.iter().map(|v| v.label()).collect();
        assert_eq!(labels, vec!["0", "1", "2", "3"]);
    }

    #[test]
    fn test_serde_uses_training_column_names_and_labels() {
        let json = serde_json::to_value(PatientRecord::default()).expect("serialize");
        assert_eq!(json["Max_heart_rate"], 150);
        assert_eq!(json["fasting_blood_sugar"], "Greater than 120 mg/ml");
        assert_eq!(json["vessels_colored_by_flourosopy"], "0");

        let back: PatientRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, PatientRecord::default());
    }

    #[test]
    fn test_defaults_sit_inside_form_domains() {
        let p = PatientRecord::default();
        assert!(PatientRecord::AGE_RANGE.contains(&p.age));
        assert!(PatientRecord::RESTING_BP_RANGE.contains(&p.resting_blood_pressure));
        assert!(PatientRecord::CHOLESTEROL_RANGE.contains(&p.cholestoral));
        assert!(PatientRecord::MAX_HEART_RATE_RANGE.contains(&p.max_heart_rate));
        assert!(PatientRecord::OLDPEAK_RANGE.contains(&p.oldpeak));
    }
}

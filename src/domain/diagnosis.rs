//! Prediction result types.
//!
//! Represents the output of the heart disease classifier.

use serde::{Deserialize, Serialize};

use super::features::DerivedFeatures;

/// Binary risk label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Class 0: heart disease not predicted
    Low,
    /// Class 1: heart disease predicted
    High,
}

impl RiskLabel {
    /// Headline shown to the user.
    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk!",
            Self::High => "High Risk!",
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129), // Emerald (#10B981)
            Self::High => (244, 63, 94), // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Label and positive-class probability read off the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Predicted class
    pub label: RiskLabel,

    /// Probability of the positive (high risk) class, 0.0 to 1.0
    pub probability: f64,
}

impl InferenceResult {
    /// Probability formatted as a percentage with two decimals.
    #[must_use]
    pub fn probability_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

/// Everything the form shows after a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub derived: DerivedFeatures,
    pub result: InferenceResult,
}

/// Per-class precision/recall/F1 from the held-out evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Held-out evaluation figures recorded by the training run.
///
/// Carried by the artifact that produced them; never computed here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluation {
    pub accuracy: f64,
    pub classes: [ClassMetrics; 2],
    /// Rows are actual class, columns predicted class.
    pub confusion_matrix: [[u32; 2]; 2],
}

impl ModelEvaluation {
    /// Number of samples in the evaluation set.
    #[must_use]
    pub fn support(&self) -> u32 {
        self.confusion_matrix.iter().flatten().sum()
    }

    /// Check the figures are proportions and that `accuracy` agrees with
    /// the confusion matrix to within rounding.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency found.
    pub fn check(&self) -> Result<(), String> {
        let proportions = std::iter::once(self.accuracy)
            .chain(self.classes.iter().flat_map(|m| [m.precision, m.recall, m.f1]));
        for v in proportions {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("evaluation figure {v} is not within [0, 1]"));
            }
        }

        let support = self.support();
        if support == 0 {
            return Err("evaluation confusion matrix is empty".into());
        }
        let correct = self.confusion_matrix[0][0] + self.confusion_matrix[1][1];
        let accuracy = f64::from(correct) / f64::from(support);
        if (accuracy - self.accuracy).abs() > 5e-3 {
            return Err(format!(
                "evaluation accuracy {} disagrees with confusion matrix ({accuracy:.4})",
                self.accuracy
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_display() {
        assert_eq!(RiskLabel::Low.to_string(), "LOW");
        assert_eq!(RiskLabel::High.headline(), "High Risk!");
    }

    #[test]
    fn test_probability_percent() {
        let r = InferenceResult {
            label: RiskLabel::High,
            probability: 0.8125,
        };
        assert_eq!(r.probability_percent(), "81.25%");
    }

    fn sample_evaluation() -> ModelEvaluation {
        ModelEvaluation {
            accuracy: 0.9805,
            classes: [
                ClassMetrics {
                    precision: 0.96,
                    recall: 1.00,
                    f1: 0.98,
                },
                ClassMetrics {
                    precision: 1.00,
                    recall: 0.96,
                    f1: 0.98,
                },
            ],
            confusion_matrix: [[150, 0], [6, 152]],
        }
    }

    #[test]
    fn test_evaluation_check_accepts_consistent_figures() {
        let m = sample_evaluation();
        assert_eq!(m.support(), 308);
        assert_eq!(m.check(), Ok(()));
    }

    #[test]
    fn test_evaluation_check_rejects_inconsistent_figures() {
        let mut m = sample_evaluation();
        m.accuracy = 0.75;
        assert!(m.check().expect_err("disagrees").contains("confusion matrix"));

        let mut m = sample_evaluation();
        m.classes[1].recall = 1.5;
        assert!(m.check().is_err());

        let mut m = sample_evaluation();
        m.confusion_matrix = [[0, 0], [0, 0]];
        assert!(m.check().is_err());
    }

    #[test]
    fn test_evaluation_parses_from_json() {
        let json = serde_json::json!({
            "accuracy": 0.5,
            "classes": [
                {"precision": 0.5, "recall": 0.5, "f1": 0.5},
                {"precision": 0.5, "recall": 0.5, "f1": 0.5}
            ],
            "confusion_matrix": [[1, 1], [1, 1]]
        });
        let m: ModelEvaluation = serde_json::from_value(json).expect("parse");
        assert_eq!(m.support(), 4);
        assert_eq!(m.check(), Ok(()));
    }
}

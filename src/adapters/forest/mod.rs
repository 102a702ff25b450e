//! Forest adapter: Implementation of `Classifier` over a tree-ensemble artifact.
//!
//! The artifact is a JSON export of a trained random forest:
//!
//! - `inputs` declares every record field the model consumes and how it is
//!   encoded into columns (`numeric`, `ordinal`, or `one_hot`),
//! - `trees` holds each decision tree in flat-array form (`children_left`,
//!   `children_right`, `feature`, `threshold`, `value`), with `-1` marking a
//!   leaf and `value[node]` holding per-class weights.
//!
//! Prediction follows the usual forest semantics: a sample goes left when
//! `x[feature] <= threshold`, each tree contributes its leaf's normalized class
//! distribution, the forest probability is the mean over trees, and the label
//! is the argmax (ties go to class 0).
//!
//! # Security
//!
//! The artifact directory may be bound by an Ed25519-signed manifest; see
//! [`manifest`]. Which directories must be signed is decided by
//! [`LoadPolicy`].

mod error;
mod manifest;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{
    CombinedRecord, FieldKind, FieldValue, ModelEvaluation, RiskLabel, SchemaMismatchError,
};
use crate::ports::Classifier;

pub use error::ArtifactLoadError;
pub use manifest::{
    sha256_hex, unix_now, validate_nonce_b64, verifying_key_from_b64, LoadPolicy, SignedManifest,
    MANIFEST_FILE_NAME, MANIFEST_VERSION, SIGNATURE_FILE_NAME,
};

/// File name of the forest artifact inside an artifact directory.
pub const ARTIFACT_FILE_NAME: &str = "heart_forest.json";

/// Artifact schema version understood by this loader.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Child index marking a leaf.
const TREE_LEAF: i64 = -1;

/// Number of classes of a binary classifier.
const N_CLASSES: usize = 2;

/// Serialized forest, as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestArtifact {
    pub format_version: u32,
    /// Class labels in column order of `value`; must be `[0, 1]`.
    pub classes: Vec<u8>,
    pub inputs: Vec<InputSpec>,
    pub trees: Vec<TreeArtifact>,
    /// Held-out metrics of this forest, when the training run recorded them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<ModelEvaluation>,
}

/// One record field consumed by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    pub encoding: Encoding,
}

/// How a record field becomes feature columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Encoding {
    /// One column holding the number itself.
    Numeric,
    /// One column holding the category's index.
    Ordinal { categories: Vec<String> },
    /// One 0/1 column per category.
    OneHot { categories: Vec<String> },
}

impl Encoding {
    fn width(&self) -> usize {
        match self {
            Self::Numeric | Self::Ordinal { .. } => 1,
            Self::OneHot { categories } => categories.len(),
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            Self::Numeric => FieldKind::Numeric,
            Self::Ordinal { .. } | Self::OneHot { .. } => FieldKind::Categorical,
        }
    }
}

/// A decision tree in flat-array form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        column: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        proba: [f64; N_CLASSES],
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to a leaf.
    ///
    /// Terminates because every child index is strictly greater than its
    /// parent's (checked at load).
    fn leaf_proba(&self, x: &[f64]) -> [f64; N_CLASSES] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    column,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*column] <= *threshold { *left } else { *right };
                }
                Node::Leaf { proba } => return *proba,
            }
        }
    }
}

#[derive(Debug, Clone)]
struct InputColumn {
    name: String,
    encoding: Encoding,
    offset: usize,
}

/// Loaded tree-ensemble classifier.
///
/// Holding a value of this type means the artifact is loaded; it is never
/// unloaded or swapped. Share it via `Arc` for concurrent readers.
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    inputs: Vec<InputColumn>,
    index: HashMap<String, usize>,
    n_columns: usize,
    trees: Vec<Tree>,
    evaluation: Option<ModelEvaluation>,
}

impl ForestClassifier {
    /// Load and validate the artifact at `path`.
    ///
    /// `path` may be the artifact file itself or the directory containing
    /// [`ARTIFACT_FILE_NAME`]. The signed manifest, when present, is checked
    /// against `policy` before the artifact is parsed.
    ///
    /// # Errors
    /// Returns [`ArtifactLoadError`] if the file is missing, unreadable,
    /// malformed, of an unsupported version, structurally invalid, or fails
    /// the signature policy.
    pub fn load(path: &Path, policy: &LoadPolicy) -> Result<Self, ArtifactLoadError> {
        let artifact_path = if path.is_dir() {
            path.join(ARTIFACT_FILE_NAME)
        } else {
            path.to_path_buf()
        };
        if !artifact_path.is_file() {
            return Err(ArtifactLoadError::NotFound(artifact_path));
        }

        let base_dir = artifact_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let artifact_name = artifact_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ArtifactLoadError::invalid("artifact file name is not valid UTF-8"))?;

        let content = manifest::read_verified_artifact(base_dir, artifact_name, policy)?;
        let artifact: ForestArtifact =
            serde_json::from_slice(&content).map_err(|source| ArtifactLoadError::Format {
                path: artifact_path.clone(),
                source,
            })?;

        let classifier = Self::from_artifact(artifact)?;

        tracing::info!(
            "Loaded forest from {:?} (n_trees={}, n_inputs={}, n_columns={})",
            artifact_path,
            classifier.trees.len(),
            classifier.inputs.len(),
            classifier.n_columns
        );

        Ok(classifier)
    }

    /// Validate an in-memory artifact.
    ///
    /// # Errors
    /// Returns [`ArtifactLoadError`] for any structural problem.
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, ArtifactLoadError> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactLoadError::UnsupportedVersion {
                found: artifact.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        if artifact.classes != [0, 1] {
            return Err(ArtifactLoadError::invalid(format!(
                "classes must be [0, 1], got {:?}",
                artifact.classes
            )));
        }

        let (inputs, index, n_columns) = Self::build_columns(artifact.inputs)?;

        if artifact.trees.is_empty() {
            return Err(ArtifactLoadError::invalid("forest has no trees"));
        }
        let trees = artifact
            .trees
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Self::build_tree(t, n_columns)
                    .map_err(|msg| ArtifactLoadError::invalid(format!("tree {i}: {msg}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(evaluation) = &artifact.evaluation {
            evaluation.check().map_err(ArtifactLoadError::invalid)?;
        }

        Ok(Self {
            inputs,
            index,
            n_columns,
            trees,
            evaluation: artifact.evaluation,
        })
    }

    fn build_columns(
        specs: Vec<InputSpec>,
    ) -> Result<(Vec<InputColumn>, HashMap<String, usize>, usize), ArtifactLoadError> {
        if specs.is_empty() {
            return Err(ArtifactLoadError::invalid("artifact declares no inputs"));
        }

        let mut inputs = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());
        let mut offset = 0;

        for spec in specs {
            if let Encoding::Ordinal { categories } | Encoding::OneHot { categories } =
                &spec.encoding
            {
                if categories.is_empty() {
                    return Err(ArtifactLoadError::invalid(format!(
                        "input {:?} has no categories",
                        spec.name
                    )));
                }
                let mut seen = std::collections::HashSet::new();
                if let Some(dup) = categories.iter().find(|c| !seen.insert(c.as_str())) {
                    return Err(ArtifactLoadError::invalid(format!(
                        "input {:?} repeats category {dup:?}",
                        spec.name
                    )));
                }
            }
            if index.insert(spec.name.clone(), inputs.len()).is_some() {
                return Err(ArtifactLoadError::invalid(format!(
                    "input {:?} declared twice",
                    spec.name
                )));
            }

            let width = spec.encoding.width();
            inputs.push(InputColumn {
                name: spec.name,
                encoding: spec.encoding,
                offset,
            });
            offset += width;
        }

        Ok((inputs, index, offset))
    }

    fn build_tree(t: &TreeArtifact, n_columns: usize) -> Result<Tree, String> {
        let n = t.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if t.children_right.len() != n
            || t.feature.len() != n
            || t.threshold.len() != n
            || t.value.len() != n
        {
            return Err("node array lengths differ".into());
        }

        let child = |node: usize, raw: i64| -> Result<usize, String> {
            usize::try_from(raw)
                .ok()
                .filter(|&c| c > node && c < n)
                .ok_or_else(|| format!("node {node} has invalid child index {raw}"))
        };

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (l, r) = (t.children_left[i], t.children_right[i]);
            let weights = &t.value[i];
            if weights.len() != N_CLASSES {
                return Err(format!(
                    "node {i} has {} class weights, expected {N_CLASSES}",
                    weights.len()
                ));
            }

            let node = match (l == TREE_LEAF, r == TREE_LEAF) {
                (true, true) => {
                    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("leaf {i} has negative or non-finite weights"));
                    }
                    let total: f64 = weights.iter().sum();
                    if total <= 0.0 {
                        return Err(format!("leaf {i} has zero total weight"));
                    }
                    Node::Leaf {
                        proba: [weights[0] / total, weights[1] / total],
                    }
                }
                (false, false) => {
                    let column = usize::try_from(t.feature[i])
                        .ok()
                        .filter(|&c| c < n_columns)
                        .ok_or_else(|| {
                            format!(
                                "node {i} splits on column {} outside 0..{n_columns}",
                                t.feature[i]
                            )
                        })?;
                    let threshold = t.threshold[i];
                    if !threshold.is_finite() {
                        return Err(format!("node {i} has non-finite threshold"));
                    }
                    Node::Split {
                        column,
                        threshold,
                        left: child(i, l)?,
                        right: child(i, r)?,
                    }
                }
                _ => return Err(format!("node {i} has exactly one child")),
            };
            nodes.push(node);
        }

        Ok(Tree { nodes })
    }

    /// Held-out metrics recorded with the artifact, if any.
    #[must_use]
    pub fn evaluation(&self) -> Option<&ModelEvaluation> {
        self.evaluation.as_ref()
    }

    /// Encode a record into the artifact's column layout.
    fn encode(&self, record: &CombinedRecord) -> Result<Vec<f64>, SchemaMismatchError> {
        let mut seen = vec![false; self.inputs.len()];
        let mut x = vec![0.0; self.n_columns];

        for field in record.fields() {
            let idx = *self
                .index
                .get(field.name)
                .ok_or_else(|| SchemaMismatchError::UnexpectedField(field.name.to_string()))?;
            if std::mem::replace(&mut seen[idx], true) {
                return Err(SchemaMismatchError::DuplicateField {
                    field: field.name.to_string(),
                });
            }

            let input = &self.inputs[idx];
            match (&input.encoding, field.value) {
                (Encoding::Numeric, FieldValue::Number(v)) => x[input.offset] = v,
                (Encoding::Ordinal { categories }, FieldValue::Category(label)) => {
                    x[input.offset] = Self::category_index(input, categories, label)? as f64;
                }
                (Encoding::OneHot { categories }, FieldValue::Category(label)) => {
                    x[input.offset + Self::category_index(input, categories, label)?] = 1.0;
                }
                (encoding, value) => {
                    return Err(SchemaMismatchError::KindMismatch {
                        field: input.name.clone(),
                        expected: encoding.kind(),
                        actual: value.kind(),
                    });
                }
            }
        }

        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(SchemaMismatchError::MissingField(
                self.inputs[missing].name.clone(),
            ));
        }

        Ok(x)
    }

    fn category_index(
        input: &InputColumn,
        categories: &[String],
        label: &str,
    ) -> Result<usize, SchemaMismatchError> {
        categories
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| SchemaMismatchError::UnknownCategory {
                field: input.name.clone(),
                value: label.to_string(),
            })
    }

    /// Mean class distribution over all trees.
    ///
    /// # Errors
    /// Returns [`SchemaMismatchError`] if the record does not fit the artifact.
    pub fn predict_proba(
        &self,
        record: &CombinedRecord,
    ) -> Result<[f64; N_CLASSES], SchemaMismatchError> {
        let x = self.encode(record)?;

        let mut sum = [0.0; N_CLASSES];
        for tree in &self.trees {
            let p = tree.leaf_proba(&x);
            sum[0] += p[0];
            sum[1] += p[1];
        }

        let n = self.trees.len() as f64;
        Ok([
            (sum[0] / n).clamp(0.0, 1.0),
            (sum[1] / n).clamp(0.0, 1.0),
        ])
    }
}

impl Classifier for ForestClassifier {
    fn feature_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| i.name.as_str()).collect()
    }

    fn classify(&self, record: &CombinedRecord) -> Result<RiskLabel, SchemaMismatchError> {
        let p = self.predict_proba(record)?;
        Ok(if p[1] > p[0] {
            RiskLabel::High
        } else {
            RiskLabel::Low
        })
    }

    fn score(&self, record: &CombinedRecord) -> Result<f64, SchemaMismatchError> {
        Ok(self.predict_proba(record)?[1])
    }
}

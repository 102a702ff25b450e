//! Artifact loading errors.

use std::path::PathBuf;

/// Failure to acquire the classifier artifact.
///
/// Fatal at startup: without a loaded artifact no prediction can be served.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactLoadError {
    #[error("Artifact not found at {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact {path:?} is not a valid forest document: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Invalid artifact: {0}")]
    Invalid(String),

    #[error("Artifact signature check failed: {0}")]
    Signature(String),
}

impl ArtifactLoadError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub(crate) fn signature(msg: impl Into<String>) -> Self {
        Self::Signature(msg.into())
    }
}

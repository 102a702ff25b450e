//! Signed manifest verification for artifact directories.
//!
//! An artifact directory may carry `manifest.json` (SHA-256 digests of the
//! files it binds) and `model.sig` (Ed25519 signature over the raw manifest
//! bytes). When present, both must verify before the artifact is parsed.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ArtifactLoadError;

/// Name of the manifest file inside an artifact directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Name of the detached signature file inside an artifact directory.
pub const SIGNATURE_FILE_NAME: &str = "model.sig";

/// Current manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at`, in seconds.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

/// Signed list of artifact files and their digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was created.
    pub created_at: i64,
    /// Random 16-byte nonce, base64.
    pub nonce_b64: String,
    /// File name (relative to the manifest) to lowercase SHA-256 hex.
    pub files: BTreeMap<String, String>,
}

/// How strictly the loader treats artifact signatures.
#[derive(Debug, Clone, Default)]
pub struct LoadPolicy {
    /// Key that must have signed the manifest.
    pub verifying_key: Option<VerifyingKey>,
    /// Accept directories without a manifest and signature.
    pub allow_unsigned: bool,
}

impl LoadPolicy {
    /// Require a manifest signed by `key`.
    #[must_use]
    pub fn signed(key: VerifyingKey) -> Self {
        Self {
            verifying_key: Some(key),
            allow_unsigned: false,
        }
    }

    /// Accept unsigned artifacts (development and tests).
    #[must_use]
    pub fn allow_unsigned() -> Self {
        Self {
            verifying_key: None,
            allow_unsigned: true,
        }
    }
}

/// Lowercase hex SHA-256 digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns [`ArtifactLoadError::Signature`] on bad base64, wrong length, or an
/// invalid curve point.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactLoadError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ArtifactLoadError::signature("Invalid public key base64"))?;
    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ArtifactLoadError::signature("Invalid public key length (expected 32 bytes)"))?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ArtifactLoadError::signature("Invalid verifying key"))
}

/// Current Unix time in seconds (0 if the clock is before the epoch).
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Validate that a nonce decodes to exactly 16 bytes.
///
/// # Errors
/// Returns [`ArtifactLoadError::Signature`] otherwise.
pub fn validate_nonce_b64(nonce_b64: &str) -> Result<(), ArtifactLoadError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(nonce_b64.trim())
        .map_err(|e| ArtifactLoadError::signature(format!("Invalid nonce base64: {e}")))?;
    if raw.len() != 16 {
        return Err(ArtifactLoadError::signature(
            "nonce must decode to exactly 16 bytes",
        ));
    }
    Ok(())
}

// Constant-time compare for ASCII strings (SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Read `artifact_name` from `base_dir`, checking it against the signed
/// manifest when one is present.
///
/// The returned bytes are the ones that were hashed, so callers parse exactly
/// what was verified.
pub(crate) fn read_verified_artifact(
    base_dir: &Path,
    artifact_name: &str,
    policy: &LoadPolicy,
) -> Result<Vec<u8>, ArtifactLoadError> {
    let artifact_path = base_dir.join(artifact_name);
    let artifact_bytes = fs::read(&artifact_path).map_err(|source| ArtifactLoadError::Io {
        path: artifact_path.clone(),
        source,
    })?;

    let sig_path = base_dir.join(SIGNATURE_FILE_NAME);
    let manifest_path = base_dir.join(MANIFEST_FILE_NAME);

    if !sig_path.exists() || !manifest_path.exists() {
        if policy.allow_unsigned {
            tracing::warn!("Loading UNSIGNED artifact from {:?}", base_dir);
            return Ok(artifact_bytes);
        }
        tracing::error!("Artifact signature not found at {:?}", sig_path);
        return Err(ArtifactLoadError::signature(format!(
            "{MANIFEST_FILE_NAME} and {SIGNATURE_FILE_NAME} are required in {base_dir:?}"
        )));
    }

    let key = policy.verifying_key.as_ref().ok_or_else(|| {
        ArtifactLoadError::signature("Artifact is signed but no verifying key is configured")
    })?;

    let sig_bytes = fs::read(&sig_path).map_err(|source| ArtifactLoadError::Io {
        path: sig_path.clone(),
        source,
    })?;
    let sig_bytes: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ArtifactLoadError::signature("Invalid signature length (expected 64 bytes)"))?;
    let signature = Signature::from_bytes(&sig_bytes);

    let manifest_content = fs::read(&manifest_path).map_err(|source| ArtifactLoadError::Io {
        path: manifest_path.clone(),
        source,
    })?;

    key.verify(&manifest_content, &signature)
        .map_err(|_| ArtifactLoadError::signature("Invalid artifact signature"))?;

    let manifest: SignedManifest = serde_json::from_slice(&manifest_content).map_err(|e| {
        ArtifactLoadError::signature(format!("Invalid {MANIFEST_FILE_NAME} format: {e}"))
    })?;

    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactLoadError::signature(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }
    validate_nonce_b64(&manifest.nonce_b64)?;
    if manifest.created_at > unix_now() + MAX_FUTURE_SKEW_SECS {
        return Err(ArtifactLoadError::signature(
            "manifest created_at is in the future",
        ));
    }

    if !manifest.files.contains_key(artifact_name) {
        return Err(ArtifactLoadError::signature(format!(
            "{MANIFEST_FILE_NAME} does not bind {artifact_name}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let actual_hex = if rel == artifact_name {
            sha256_hex(&artifact_bytes)
        } else {
            let path = base_dir.join(rel);
            let bytes = fs::read(&path).map_err(|e| {
                ArtifactLoadError::signature(format!(
                    "Manifest references missing/unreadable file {path:?}: {e}"
                ))
            })?;
            sha256_hex(&bytes)
        };
        if !constant_time_eq_str(&actual_hex, &expected_hex.to_ascii_lowercase()) {
            return Err(ArtifactLoadError::signature(format!(
                "File hash mismatch for {rel}"
            )));
        }
    }

    tracing::info!("Artifact signature and hashes verified");
    Ok(artifact_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq_str("abcd", "abcd"));
        assert!(!constant_time_eq_str("abcd", "abce"));
        assert!(!constant_time_eq_str("abc", "abcd"));
    }

    #[test]
    fn test_nonce_validation() {
        let good = base64::engine::general_purpose::STANDARD.encode([7u8; 16]);
        let short = base64::engine::general_purpose::STANDARD.encode([7u8; 8]);
        assert!(validate_nonce_b64(&good).is_ok());
        assert!(validate_nonce_b64(&short).is_err());
        assert!(validate_nonce_b64("not base64!").is_err());
    }

    #[test]
    fn test_verifying_key_from_b64_rejects_wrong_length() {
        let b64 = base64::engine::general_purpose::STANDARD.encode([1u8; 16]);
        let err = verifying_key_from_b64(&b64).expect_err("too short");
        assert!(err.to_string().contains("length"));
    }

    #[test]
    fn test_unsigned_directory_requires_opt_in() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("heart_forest.json"), b"{}").expect("write");

        let strict = LoadPolicy::default();
        assert!(matches!(
            read_verified_artifact(dir.path(), "heart_forest.json", &strict),
            Err(ArtifactLoadError::Signature(_))
        ));

        let lenient = LoadPolicy::allow_unsigned();
        assert_eq!(
            read_verified_artifact(dir.path(), "heart_forest.json", &lenient)
                .expect("unsigned allowed"),
            b"{}".to_vec()
        );
    }

    #[test]
    fn test_signed_read_returns_the_hashed_bytes() {
        use ed25519_dalek::{Signer, SigningKey};

        let dir = tempfile::tempdir().expect("tempdir");
        let artifact = br#"{"format_version":1}"#;
        fs::write(dir.path().join("heart_forest.json"), artifact).expect("write artifact");

        let manifest = SignedManifest {
            version: MANIFEST_VERSION,
            created_at: unix_now(),
            nonce_b64: base64::engine::general_purpose::STANDARD.encode([3u8; 16]),
            files: BTreeMap::from([("heart_forest.json".to_string(), sha256_hex(artifact))]),
        };
        let manifest_bytes = serde_json::to_vec(&manifest).expect("serialize");
        let key = SigningKey::from_bytes(&[5u8; 32]);
        fs::write(dir.path().join(MANIFEST_FILE_NAME), &manifest_bytes).expect("write manifest");
        fs::write(
            dir.path().join(SIGNATURE_FILE_NAME),
            key.sign(&manifest_bytes).to_bytes(),
        )
        .expect("write sig");

        let policy = LoadPolicy::signed(key.verifying_key());
        let bytes = read_verified_artifact(dir.path(), "heart_forest.json", &policy)
            .expect("verified");
        assert_eq!(bytes, artifact.to_vec());
    }
}

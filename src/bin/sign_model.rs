//! Artifact signing utility for heart-risk forest artifacts.
//!
//! Writes a manifest (`manifest.json`) binding the SHA-256 of
//! `heart_forest.json`, and an Ed25519 signature over it (`model.sig`), so the
//! predictor can verify the artifact before loading it.
//!
//! # Usage
//!
//! ```bash
//! HEARTRISK_SIGNING_KEY_B64_FILE=seed.b64 cargo run --bin sign_model -- <artifact_dir> [--nonce-b64 <b64>]
//! ```
//!
//! The signing seed is read from the file named by
//! `HEARTRISK_SIGNING_KEY_B64_FILE` (or `HEARTRISK_SIGNING_KEY_B64` directly,
//! debug builds only) and zeroized after use.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use heart_risk::adapters::forest::{
    sha256_hex, unix_now, validate_nonce_b64, SignedManifest, ARTIFACT_FILE_NAME, MANIFEST_FILE_NAME,
    MANIFEST_VERSION, SIGNATURE_FILE_NAME,
};

const KEY_FILE_ENV: &str = "HEARTRISK_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "HEARTRISK_SIGNING_KEY_B64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
        );
        let secret = content.trim_end_matches(['\n', '\r']).to_string();
        if secret.is_empty() {
            bail!("Empty signing key");
        }
        return Ok(Zeroizing::new(secret));
    }

    // Dev-only fallback.
    if cfg!(debug_assertions) {
        if let Ok(v) = env::var(KEY_ENV) {
            let secret = v.trim_end_matches(['\n', '\r']).to_string();
            if secret.is_empty() {
                bail!("Empty signing key");
            }
            return Ok(Zeroizing::new(secret));
        }
    }

    bail!("Missing signing key. Set {KEY_FILE_ENV} ({KEY_ENV} is honored only in debug builds).")
}

fn read_signing_seed() -> Result<Seed> {
    let v = read_signing_seed_b64()?;

    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(v.trim())
            .context("Invalid base64 in signing key")?,
    );

    if raw.len() != 32 {
        bail!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        );
    }

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&raw);
    Ok(Seed(seed))
}

fn usage() -> anyhow::Error {
    anyhow::anyhow!("Usage: sign_model <artifact_dir> [--nonce-b64 <b64_16_bytes>]")
}

fn parse_args() -> Result<(PathBuf, Option<String>)> {
    let mut args = env::args().skip(1);
    let mut artifact_dir: Option<PathBuf> = None;
    let mut nonce_b64: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--nonce-b64" => {
                nonce_b64 = Some(args.next().ok_or_else(usage)?);
            }
            "-h" | "--help" => return Err(usage()),
            _ if artifact_dir.is_none() => artifact_dir = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    Ok((artifact_dir.ok_or_else(usage)?, nonce_b64))
}

fn make_nonce_b64() -> String {
    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    general_purpose::STANDARD.encode(nonce)
}

fn main() -> Result<()> {
    let (artifact_dir, nonce_arg) = parse_args()?;

    let artifact_dir = if artifact_dir.is_file() {
        artifact_dir
            .parent()
            .context("Artifact path has no parent directory")?
            .to_path_buf()
    } else {
        artifact_dir
    };

    let artifact_path = artifact_dir.join(ARTIFACT_FILE_NAME);
    let artifact_bytes = fs::read(&artifact_path)
        .with_context(|| format!("No artifact found at {artifact_path:?}"))?;

    let mut files = BTreeMap::new();
    files.insert(ARTIFACT_FILE_NAME.to_string(), sha256_hex(&artifact_bytes));

    let nonce_b64 = match nonce_arg {
        Some(v) => {
            validate_nonce_b64(&v)?;
            v
        }
        None => make_nonce_b64(),
    };

    let manifest = SignedManifest {
        version: MANIFEST_VERSION,
        created_at: unix_now(),
        nonce_b64,
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let mut seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    let verifying_key = signing_key.verifying_key();

    let manifest_path = artifact_dir.join(MANIFEST_FILE_NAME);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = artifact_dir.join(SIGNATURE_FILE_NAME);
    fs::write(&sig_path, sig.to_bytes()).with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "PUBKEY (base64)={}",
        general_purpose::STANDARD.encode(verifying_key.as_bytes())
    );

    seed.zeroize();

    Ok(())
}

//! Runtime configuration for the `heart-risk` binary, read from the
//! environment.
//!
//! | variable | default |
//! |---|---|
//! | `HEARTRISK_MODEL_PATH` | `models` |
//! | `HEARTRISK_ARTIFACT_PUBKEY_B64_FILE` | unset |
//! | `HEARTRISK_ALLOW_UNSIGNED_ARTIFACT` | `false` (debug builds only) |
//! | `HEARTRISK_LOG_MODE` | `auto` |
//! | `HEARTRISK_LOG_FILE` | `heart-risk.log` |

use std::path::PathBuf;

use anyhow::{Context, Result};

use heart_risk::adapters::forest::verifying_key_from_b64;
use heart_risk::adapters::LoadPolicy;

const MODEL_PATH_ENV: &str = "HEARTRISK_MODEL_PATH";
const PUBKEY_FILE_ENV: &str = "HEARTRISK_ARTIFACT_PUBKEY_B64_FILE";
const ALLOW_UNSIGNED_ENV: &str = "HEARTRISK_ALLOW_UNSIGNED_ARTIFACT";
const LOG_MODE_ENV: &str = "HEARTRISK_LOG_MODE";
const LOG_FILE_ENV: &str = "HEARTRISK_LOG_FILE";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    File,
    Stdout,
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    Auto,
}

impl LogMode {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub pubkey_file: Option<PathBuf>,
    pub allow_unsigned: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

fn parse_bool(v: &str) -> bool {
    matches!(v.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let requested_unsigned = lookup(ALLOW_UNSIGNED_ENV).is_some_and(|v| parse_bool(&v));

        Self {
            model_path: lookup(MODEL_PATH_ENV)
                .filter(|v| !v.trim().is_empty())
                .map_or_else(|| PathBuf::from("models"), PathBuf::from),
            pubkey_file: lookup(PUBKEY_FILE_ENV)
                .filter(|v| !v.trim().is_empty())
                .map(|v| PathBuf::from(v.trim())),
            allow_unsigned: requested_unsigned && cfg!(debug_assertions),
            log_mode: lookup(LOG_MODE_ENV).map_or(LogMode::Auto, |v| LogMode::parse(&v)),
            log_file: lookup(LOG_FILE_ENV)
                .filter(|v| !v.trim().is_empty())
                .map_or_else(|| PathBuf::from("heart-risk.log"), PathBuf::from),
        }
    }

    /// Build the artifact load policy, reading the verifying key if configured.
    ///
    /// # Errors
    /// Fails if the key file cannot be read or does not hold a valid key.
    pub fn load_policy(&self) -> Result<LoadPolicy> {
        let verifying_key = match &self.pubkey_file {
            Some(path) => {
                let b64 = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read public key file {path:?}"))?;
                Some(verifying_key_from_b64(&b64)?)
            }
            None => None,
        };

        Ok(LoadPolicy {
            verifying_key,
            allow_unsigned: self.allow_unsigned,
        })
    }
}

//! Ed25519 keypair generation utility for artifact signing.
//!
//! Generates a signing keypair:
//! - Private seed (32 bytes, base64) written to file with 0600 permissions
//! - Public key (base64) optionally written separately, for
//!   `HEARTRISK_ARTIFACT_PUBKEY_B64_FILE`
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_keypair -- --out-seed <path> [--out-pub <path>] [--force]
//! ```

use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

const USAGE: &str = "Usage: generate_keypair --out-seed <path> [--out-pub <path>] [--force]";

struct Args {
    out_seed: PathBuf,
    out_pub: Option<PathBuf>,
    force: bool,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = std::env::args().skip(1);
    let mut out_seed: Option<PathBuf> = None;
    let mut out_pub: Option<PathBuf> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-seed" => {
                out_seed = Some(args.next().filter(|p| !p.is_empty()).ok_or_else(|| anyhow!(USAGE))?.into());
            }
            "--out-pub" => {
                out_pub = Some(args.next().filter(|p| !p.is_empty()).ok_or_else(|| anyhow!(USAGE))?.into());
            }
            "--force" => force = true,
            "-h" | "--help" => {
                println!(
                    "{USAGE}\n\nWrites the base64 Ed25519 seed to <path> with 0600 permissions. Optionally writes the base64 public key to --out-pub. Prints only non-secret material."
                );
                return Ok(None);
            }
            _ => bail!("Unknown arg: {arg}\n{USAGE}"),
        }
    }

    Ok(Some(Args {
        out_seed: out_seed.ok_or_else(|| anyhow!(USAGE))?,
        out_pub,
        force,
    }))
}

fn write_file(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {parent:?}"))?;
    }

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = opts
        .open(path)
        .with_context(|| format!("Failed to open {path:?}"))?;
    file.write_all(contents)?;
    file.write_all(b"\n")?;
    Ok(())
}

fn main() -> Result<()> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };

    for path in std::iter::once(&args.out_seed).chain(args.out_pub.as_ref()) {
        if path.exists() && !args.force {
            bail!("Refusing to overwrite existing file {path:?}. Use --force.");
        }
    }

    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);

    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();

    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed));
    let pub_b64 = general_purpose::STANDARD.encode(verifying_key.as_bytes());
    seed.zeroize();

    write_file(&args.out_seed, seed_b64.as_bytes(), 0o600)?;
    println!("Wrote signing seed (base64) to {:?}", args.out_seed);

    if let Some(pub_path) = &args.out_pub {
        write_file(pub_path, pub_b64.as_bytes(), 0o644)?;
        println!("Wrote public key (base64) to {pub_path:?}");
    }

    println!("PUBKEY (base64)={pub_b64}");
    Ok(())
}

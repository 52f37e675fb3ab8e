//! CLI tool to generate the master encryption key or the session signing secret.
//!
//! Usage:
//!   cargo run --bin generate-secret
//!   cargo run --bin generate-secret -- --out /run/secrets/encryption_key

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use zeroize::Zeroizing;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut out: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--out" | "-o" => {
                i += 1;
                if i < args.len() {
                    out = Some(PathBuf::from(&args[i]));
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let bytes: Zeroizing<[u8; 32]> = Zeroizing::new(rand::random());
    let encoded = Zeroizing::new(STANDARD.encode(bytes.as_slice()));

    match out {
        Some(path) => {
            if let Err(e) = write_secret(&path, &encoded) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                std::process::exit(1);
            }
            println!("Secret written to {}", path.display());
        }
        None => println!("{}", encoded.as_str()),
    }
}

/// Create `path` (refusing to overwrite) readable only by its owner.
fn write_secret(path: &Path, encoded: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    writeln!(file, "{}", encoded)?;
    file.sync_all()
}

fn print_usage() {
    eprintln!(
        r#"
Generate a random 32-byte secret, base64 encoded.

Usable as ENCRYPTION_KEY_FILE (master key) or JWT_SECRET_FILE contents.

Usage:
  generate-secret [--out <path>]

Options:
  -o, --out <path>  Write the secret to a new file (mode 0600) instead of stdout
  -h, --help        Show this help message
"#
    );
}

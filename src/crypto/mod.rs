//! Key material and symmetric cryptography.
//!
//! - [`MasterKey`]: the process-wide AES-256 master key, loaded once from a file
//! - [`Kdf`]: Argon2id derivation, run off the async workers behind a semaphore
//! - [`CredentialCipher`]: AES-256-GCM sealing of stored mail-account passwords

mod cipher;
mod kdf;
mod master_key;

pub use cipher::{CredentialCipher, IV_LEN, SALT_LEN, TAG_LEN};
pub use kdf::Kdf;
pub use master_key::{MASTER_KEY_LEN, MasterKey};

#[cfg(test)]
pub(crate) use kdf::test_settings;

use crate::config::ConfigError;

/// Errors raised by the crypto primitives.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Key material is missing or malformed
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Argon2 rejected its parameters or inputs
    #[error("Key derivation failed: {0}")]
    Kdf(String),

    /// The AEAD refused to seal the plaintext
    #[error("Encryption failed")]
    Encryption,

    /// Tag mismatch, truncated blob, bad encoding or wrong key
    #[error("Decryption failed")]
    Decryption,
}

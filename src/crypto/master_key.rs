//! Master encryption key, loaded once per process.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretBox};
use tracing::info;
use zeroize::Zeroizing;

use crate::config::ConfigError;

/// AES-256 key length in bytes.
pub const MASTER_KEY_LEN: usize = 32;

static MASTER_KEY: OnceLock<Arc<MasterKey>> = OnceLock::new();

/// The 32-byte master key every credential key is derived from.
///
/// # Security
/// - `Debug` prints `[REDACTED]`
/// - Memory is zeroed when dropped
/// - The key is never written anywhere by this type
pub struct MasterKey(SecretBox<[u8; MASTER_KEY_LEN]>);

impl MasterKey {
    /// Load the process-wide master key from `path`.
    ///
    /// The first successful call reads and decodes the file; every later call
    /// returns the cached key without touching the file system.
    pub fn load(path: &Path) -> Result<Arc<MasterKey>, ConfigError> {
        if let Some(key) = MASTER_KEY.get() {
            return Ok(Arc::clone(key));
        }

        let encoded = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            ConfigError::SecretFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?);

        let key = Self::from_base64(&encoded).map_err(|e| ConfigError::SecretFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // A concurrent first load may have won the race; either way the stored key is returned.
        let stored = MASTER_KEY.get_or_init(|| Arc::new(key));
        info!("Master encryption key loaded");
        Ok(Arc::clone(stored))
    }

    /// Build a key from base64 text. Keys longer than 32 bytes are truncated.
    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let decoded = Zeroizing::new(STANDARD.decode(encoded.trim()).map_err(|_| {
            ConfigError::InvalidValue("encryption key must be valid base64")
        })?);

        if decoded.len() < MASTER_KEY_LEN {
            return Err(ConfigError::InvalidValue(
                "encryption key must be at least 32 bytes",
            ));
        }

        let mut key = Box::new([0u8; MASTER_KEY_LEN]);
        key.copy_from_slice(&decoded[..MASTER_KEY_LEN]);
        Ok(Self(SecretBox::new(key)))
    }

    pub(crate) fn expose(&self) -> &[u8; MASTER_KEY_LEN] {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterKey([REDACTED])")
    }
}

//! Argon2id key derivation, bounded to a fixed number of concurrent computations.

use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};
use tokio::sync::Semaphore;
use zeroize::Zeroizing;

use super::CryptoError;
use crate::config::{ConfigError, KdfSettings};

/// Memory-hard key derivation shared by the password hasher and the credential cipher.
///
/// Each derivation runs on the blocking thread pool. A semaphore caps how many
/// run at once so a burst of logins cannot starve the host of CPU.
#[derive(Clone)]
pub struct Kdf {
    params: Params,
    permits: Arc<Semaphore>,
}

impl Kdf {
    /// Create a KDF from configured cost parameters.
    pub fn new(settings: &KdfSettings) -> Result<Self, CryptoError> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|_| ConfigError::InvalidValue("Argon2 cost parameters are out of range"))?;

        Ok(Self {
            params,
            permits: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
        })
    }

    /// Derive `output_len` bytes from `secret` and `salt`.
    pub async fn derive(
        &self,
        secret: Zeroizing<Vec<u8>>,
        salt: Vec<u8>,
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| CryptoError::Kdf(e.to_string()))?;

        let params = self.params.clone();
        tokio::task::spawn_blocking(move || derive_blocking(params, &secret, &salt, output_len))
            .await
            .map_err(|e| CryptoError::Kdf(e.to_string()))?
    }
}

fn derive_blocking(
    params: Params,
    secret: &[u8],
    salt: &[u8],
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut output = Zeroizing::new(vec![0u8; output_len]);
    argon2
        .hash_password_into(secret, salt, &mut output)
        .map_err(|e| CryptoError::Kdf(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
pub(crate) fn test_settings() -> KdfSettings {
    KdfSettings {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
        max_concurrent: 4,
    }
}

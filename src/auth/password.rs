//! Salted Argon2id password hashes in `salt_hex:hash_hex` form.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tokio::sync::OnceCell;
use tracing::warn;
use zeroize::Zeroizing;

use crate::crypto::{CryptoError, Kdf};

/// Random salt length in bytes.
pub const PASSWORD_SALT_LEN: usize = 32;
/// Derived hash length in bytes.
pub const PASSWORD_HASH_LEN: usize = 64;

const DUMMY_PASSWORD: &str = "dummy-password-for-timing-equalization";

/// Hashes and verifies login passwords.
#[derive(Clone)]
pub struct PasswordHasher {
    kdf: Kdf,
    dummy: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    pub fn new(kdf: Kdf) -> Self {
        Self {
            kdf,
            dummy: Arc::new(OnceCell::new()),
        }
    }

    /// Hash `password` with a fresh random salt.
    pub async fn hash(&self, password: &str) -> Result<String, CryptoError> {
        let salt: [u8; PASSWORD_SALT_LEN] = rand::random();
        let derived = self
            .kdf
            .derive(
                Zeroizing::new(password.as_bytes().to_vec()),
                salt.to_vec(),
                PASSWORD_HASH_LEN,
            )
            .await?;

        Ok(format!("{}:{}", hex::encode(salt), hex::encode(derived.as_slice())))
    }

    /// Check `password` against a stored hash.
    ///
    /// Malformed stored values and KDF failures return `false` so callers
    /// cannot tell them apart from a wrong password.
    pub async fn verify(&self, password: &str, stored: &str) -> bool {
        let Some((salt_hex, hash_hex)) = stored.split_once(':') else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(hash_hex)) else {
            return false;
        };

        match self
            .kdf
            .derive(
                Zeroizing::new(password.as_bytes().to_vec()),
                salt,
                PASSWORD_HASH_LEN,
            )
            .await
        {
            // ct_eq on slices of different length is false without an early exit.
            Ok(derived) => derived.as_slice().ct_eq(&expected).into(),
            Err(e) => {
                warn!("Password verification failed to derive: {}", e);
                false
            }
        }
    }

    /// Compute the throwaway hash used by [`verify_dummy`](Self::verify_dummy).
    ///
    /// Call at startup so the first unknown-email login costs one KDF run,
    /// like every other login.
    pub async fn prepare_dummy(&self) -> Result<(), CryptoError> {
        self.dummy_hash().await.map(|_| ())
    }

    /// Spend one verification's worth of work against a throwaway hash.
    ///
    /// Used when the account does not exist so the response time matches a
    /// wrong-password attempt.
    pub async fn verify_dummy(&self, password: &str) {
        match self.dummy_hash().await {
            Ok(stored) => {
                let _ = self.verify(password, stored).await;
            }
            Err(e) => warn!("Could not prepare dummy password hash: {}", e),
        }
    }

    async fn dummy_hash(&self) -> Result<&String, CryptoError> {
        self.dummy
            .get_or_try_init(|| self.hash(DUMMY_PASSWORD))
            .await
    }
}

//! AES-256-GCM sealing of stored mail-account credentials.
//!
//! Stored layout (base64 of the concatenation):
//!
//! ```text
//! salt (32) | iv (16) | auth tag (16) | ciphertext (variable)
//! ```
//!
//! Every call draws a fresh salt and IV. The AES key is derived per record
//! from the master key and the record's salt.

use std::sync::Arc;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;
use zeroize::Zeroizing;

use super::{CryptoError, Kdf, MASTER_KEY_LEN, MasterKey};

/// Per-record salt length.
pub const SALT_LEN: usize = 32;
/// GCM IV length.
pub const IV_LEN: usize = 16;
/// GCM authentication tag length.
pub const TAG_LEN: usize = 16;

const HEADER_LEN: usize = SALT_LEN + IV_LEN + TAG_LEN;

/// AES-256-GCM with a 128-bit IV.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Seals and unseals credentials with keys derived from the master key.
#[derive(Clone)]
pub struct CredentialCipher {
    master: Arc<MasterKey>,
    kdf: Kdf,
}

impl CredentialCipher {
    pub fn new(master: Arc<MasterKey>, kdf: Kdf) -> Self {
        Self { master, kdf }
    }

    /// Encrypt `plaintext` into a base64 blob.
    pub async fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let salt: [u8; SALT_LEN] = rand::random();
        let iv: [u8; IV_LEN] = rand::random();

        let cipher = self.cipher_for(&salt).await?;
        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| CryptoError::Encryption)?;

        let mut combined = Vec::with_capacity(HEADER_LEN + buffer.len());
        combined.extend_from_slice(&salt);
        combined.extend_from_slice(&iv);
        combined.extend_from_slice(tag.as_slice());
        combined.extend_from_slice(&buffer);

        Ok(STANDARD.encode(combined))
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// Fails closed: a bad encoding, a truncated blob, a tag mismatch, a wrong
    /// master key or non-UTF-8 plaintext all yield [`CryptoError::Decryption`].
    pub async fn decrypt(&self, blob: &str) -> Result<SecretString, CryptoError> {
        let combined = STANDARD
            .decode(blob.trim())
            .map_err(|_| CryptoError::Decryption)?;
        if combined.len() < HEADER_LEN {
            return Err(CryptoError::Decryption);
        }

        let (salt, rest) = combined.split_at(SALT_LEN);
        let (iv, rest) = rest.split_at(IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let cipher = self.cipher_for(salt).await?;
        let mut buffer = Zeroizing::new(ciphertext.to_vec());
        cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(iv),
                b"",
                &mut buffer,
                Tag::from_slice(tag),
            )
            .map_err(|_| CryptoError::Decryption)?;

        let plaintext =
            String::from_utf8(buffer.to_vec()).map_err(|_| CryptoError::Decryption)?;
        Ok(SecretString::from(plaintext))
    }

    async fn cipher_for(&self, salt: &[u8]) -> Result<Aes256Gcm16, CryptoError> {
        let secret = Zeroizing::new(self.master.expose().to_vec());
        let key = self.kdf.derive(secret, salt.to_vec(), MASTER_KEY_LEN).await?;
        Aes256Gcm16::new_from_slice(&key).map_err(|_| CryptoError::Encryption)
    }
}

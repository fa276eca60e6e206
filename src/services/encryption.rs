// src/services/encryption.rs
//! AES-256-GCM sealing for secret site settings (provider API keys, storage credentials)

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use std::env;
use thiserror::Error;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("ENCRYPTION_MASTER_KEY is not set")]
    KeyNotConfigured,

    #[error("Master key must be base64 encoding of {KEY_LEN} bytes")]
    InvalidKeyFormat,

    #[error("Sealing failed: {0}")]
    EncryptionFailed(String),

    #[error("Opening failed: {0}")]
    DecryptionFailed(String),

    #[error("Sealed value is not valid base64 nonce+ciphertext")]
    InvalidDataFormat,
}

pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionService(<key hidden>)")
    }
}

impl EncryptionService {
    pub fn from_env() -> Result<Self, EncryptionError> {
        let key = env::var("ENCRYPTION_MASTER_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(EncryptionError::KeyNotConfigured)?;
        Self::from_key(key.trim())
    }

    #[allow(deprecated)]
    pub fn from_key(encoded_key: &str) -> Result<Self, EncryptionError> {
        let key_bytes = BASE64
            .decode(encoded_key.as_bytes())
            .map_err(|_| EncryptionError::InvalidKeyFormat)?;
        if key_bytes.len() != KEY_LEN {
            return Err(EncryptionError::InvalidKeyFormat);
        }

        let key = aes_gcm::Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Fresh random master key, base64 encoded
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        BASE64.encode(key)
    }

    /// Output layout: base64(nonce || ciphertext)
    #[allow(deprecated)]
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(BASE64.encode(out))
    }

    #[allow(deprecated)]
    pub fn decrypt(&self, sealed: &str) -> Result<String, EncryptionError> {
        let raw = BASE64
            .decode(sealed.as_bytes())
            .map_err(|_| EncryptionError::InvalidDataFormat)?;
        if raw.len() <= NONCE_LEN {
            return Err(EncryptionError::InvalidDataFormat);
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let opened = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(opened)
            .map_err(|_| EncryptionError::DecryptionFailed("invalid UTF-8".to_string()))
    }
}

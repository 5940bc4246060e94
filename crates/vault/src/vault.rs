//! Key normalization plus seal/open over the sealed text format.

use zeroize::Zeroizing;

use crate::{chacha20::ChaCha20Poly1305Cipher, error::VaultError, format, traits::Cipher};

/// Seals and opens credential strings with a process-wide key.
///
/// Never logs key material or plaintext; callers log blob previews at most.
pub struct Vault {
    key: Zeroizing<[u8; 32]>,
    cipher: Box<dyn Cipher>,
}

impl Vault {
    /// Builds a vault from the configured secret.
    ///
    /// A 64-character hex secret is decoded to the raw 32-byte key; anything
    /// else is taken as UTF-8 and truncated or zero-padded to 32 bytes, so
    /// operator passphrases of any length yield a usable key.
    pub fn new(secret: &str) -> Self {
        Self::with_cipher(secret, Box::new(ChaCha20Poly1305Cipher))
    }

    pub fn with_cipher(secret: &str, cipher: Box<dyn Cipher>) -> Self {
        Self {
            key: normalize_secret(secret),
            cipher,
        }
    }

    /// Encrypts `plaintext` into a `<nonceHex>:<tagHex>:<ciphertextHex>`
    /// blob under a fresh random nonce.
    pub fn seal(&self, plaintext: &str) -> Result<String, VaultError> {
        let parts = self.cipher.encrypt(&self.key, plaintext.as_bytes())?;
        Ok(format::encode(&parts))
    }

    /// Decrypts a blob produced by [`seal`](Self::seal).
    ///
    /// Malformed blobs fail with [`VaultError::Format`]; a tag mismatch
    /// fails with [`VaultError::Authentication`]. There is no plaintext
    /// passthrough for values that do not parse.
    pub fn open(&self, blob: &str) -> Result<String, VaultError> {
        let parts = format::parse(blob)?;
        if parts.nonce.len() != self.cipher.nonce_len() {
            return Err(VaultError::Format("unsupported nonce length"));
        }
        let plaintext = self.cipher.decrypt(&self.key, &parts)?;
        String::from_utf8(plaintext)
            .map_err(|_| VaultError::Cipher("decrypted payload is not valid utf-8".to_string()))
    }
}

fn normalize_secret(secret: &str) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    if secret.len() == 64
        && let Ok(raw) = hex::decode(secret)
    {
        key.copy_from_slice(&raw);
        return key;
    }
    let bytes = secret.as_bytes();
    let take = bytes.len().min(32);
    key[..take].copy_from_slice(&bytes[..take]);
    key
}

//! ChaCha20-Poly1305 implementation of the [`Cipher`] trait.

#[allow(deprecated)] // upstream generic-array 0.x deprecation
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;

use crate::{
    error::VaultError,
    format::{NONCE_LEN, SealedParts, TAG_LEN},
    traits::Cipher,
};

/// ChaCha20-Poly1305 AEAD cipher with a 12-byte nonce and detached 16-byte
/// Poly1305 tag.
pub struct ChaCha20Poly1305Cipher;

impl Cipher for ChaCha20Poly1305Cipher {
    fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    #[allow(deprecated)]
    fn encrypt(&self, key: &[u8; 32], plaintext: &[u8]) -> Result<SealedParts, VaultError> {
        let cipher = ChaCha20Poly1305::new(key.into());

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut sealed = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| VaultError::Cipher(e.to_string()))?;

        // The aead crate appends the tag to the ciphertext; the text format
        // stores it as its own segment.
        if sealed.len() < TAG_LEN {
            return Err(VaultError::Cipher("sealed output shorter than tag".to_string()));
        }
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(SealedParts {
            nonce: nonce_bytes.to_vec(),
            tag,
            ciphertext: sealed,
        })
    }

    #[allow(deprecated)]
    fn decrypt(&self, key: &[u8; 32], parts: &SealedParts) -> Result<Vec<u8>, VaultError> {
        if parts.nonce.len() != NONCE_LEN {
            return Err(VaultError::Format("unsupported nonce length"));
        }

        let nonce = Nonce::from_slice(&parts.nonce);
        let cipher = ChaCha20Poly1305::new(key.into());

        let mut joined = Vec::with_capacity(parts.ciphertext.len() + parts.tag.len());
        joined.extend_from_slice(&parts.ciphertext);
        joined.extend_from_slice(&parts.tag);

        cipher
            .decrypt(nonce, joined.as_slice())
            .map_err(|_| VaultError::Authentication)
    }
}

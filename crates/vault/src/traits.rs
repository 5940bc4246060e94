//! Cipher trait for swappable authenticated encryption backends.

use crate::{error::VaultError, format::SealedParts};

/// Trait for authenticated encryption producing detached-tag blobs.
///
/// Implementations can be swapped without changing the rest of the vault.
/// The sealed text format stores nonce, tag, and ciphertext as separate hex
/// segments, so the cipher returns them as separate parts.
pub trait Cipher: Send + Sync {
    /// Nonce length in bytes for blobs this cipher produces.
    fn nonce_len(&self) -> usize;

    /// Encrypt `plaintext` with `key` under a fresh random nonce.
    fn encrypt(&self, key: &[u8; 32], plaintext: &[u8]) -> Result<SealedParts, VaultError>;

    /// Decrypt parts previously produced by [`encrypt`](Self::encrypt).
    ///
    /// Fails with [`VaultError::Authentication`] when the tag does not
    /// verify; never returns unauthenticated plaintext.
    fn decrypt(&self, key: &[u8; 32], parts: &SealedParts) -> Result<Vec<u8>, VaultError>;
}

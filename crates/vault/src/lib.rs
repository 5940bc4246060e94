//! Encryption-at-rest for worker credentials using ChaCha20-Poly1305.
//!
//! Secrets are stored as `<nonceHex>:<tagHex>:<ciphertextHex>` text blobs.
//! The vault is a pure transform over that format: it owns no storage and
//! keeps no state beyond the normalized key. Trait-based [`Cipher`] design
//! allows swapping the encryption backend.

pub mod chacha20;
pub mod error;
pub mod format;
pub mod traits;
pub mod vault;

pub use {
    chacha20::ChaCha20Poly1305Cipher,
    error::VaultError,
    format::{SealedParts, looks_sealed},
    traits::Cipher,
    vault::Vault,
};

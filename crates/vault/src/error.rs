//! Vault error types.

/// Errors produced by vault operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VaultError {
    /// The blob does not parse as `<nonceHex>:<tagHex>:<ciphertextHex>`.
    #[error("malformed sealed blob: {0}")]
    Format(&'static str),

    /// The authentication tag did not verify (wrong key or tampered blob).
    #[error("sealed blob failed authentication")]
    Authentication,

    /// Cipher backend failure unrelated to tag verification.
    #[error("cipher error: {0}")]
    Cipher(String),
}

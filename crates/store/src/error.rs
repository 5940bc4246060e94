//! Store error types.

use {mirrorplane_entitlement::EntitlementError, mirrorplane_vault::VaultError};

/// Errors produced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row missing. The message stays generic so HTTP mappings cannot leak
    /// whether an id exists but belongs to someone else.
    #[error("not found")]
    NotFound,

    /// Input rejected before any write happened.
    #[error("{0}")]
    Validation(String),

    /// An entitlement rule rejected the mutation.
    #[error(transparent)]
    Entitlement(#[from] EntitlementError),

    /// Sealing or opening a stored credential failed.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// A JSON-encoded column failed to (de)serialize.
    #[error("column encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A stored column held a value outside the expected vocabulary.
    #[error("corrupt column: {0}")]
    Corrupt(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

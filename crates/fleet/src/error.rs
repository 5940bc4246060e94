//! Fleet error types.

use {mirrorplane_store::StoreError, mirrorplane_vault::VaultError};

/// Errors surfaced while assembling worker snapshots.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// The store read failed or the target row does not exist.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored credential could not be opened.
    #[error(transparent)]
    Vault(#[from] VaultError),
}

//! Billing error types.

use mirrorplane_store::StoreError;

/// Errors produced while handling a payment notification.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// The notification body was not valid JSON for the expected shape.
    #[error("invalid notification payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The recomputed signature did not match `signature_key`.
    #[error("signature mismatch")]
    Signature,

    /// The order id did not match `DISBOT-<userId>-<timestamp>`.
    #[error("malformed order id: {0}")]
    MalformedOrder(String),

    /// The gross amount matched no entry in the price table.
    #[error("amount matches no plan: {0}")]
    UnknownAmount(String),

    /// The provider status vocabulary was not recognized.
    #[error("unknown provider status: {0}")]
    UnknownStatus(String),

    /// Persisting the outcome failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

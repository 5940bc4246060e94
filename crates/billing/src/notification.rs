//! Notification verification and application.

use {
    serde::{Deserialize, Serialize},
    sha2::{Digest, Sha512},
    tracing::{debug, info},
};

use mirrorplane_store::{ControlStore, PaymentRecord, PaymentStatus};

use crate::{
    error::BillingError,
    order::parse_order_id,
    price::{SUBSCRIPTION_PERIOD_MS, plan_for_amount},
};

/// The provider's webhook body, as far as this plane reads it.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    pub status_code: String,
    /// Raw amount string, signed as sent. May carry a `.00` fraction.
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
}

/// What one notification did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationResult {
    pub order_id: String,
    pub user_id: String,
    pub status: PaymentStatus,
    /// True when the order was already terminal and nothing was written.
    pub replayed: bool,
}

/// The provider's signature: sha512 over the ordered concatenation of
/// order id, status code, gross amount, and the server key.
pub fn compute_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-time string comparison (prevents timing attacks).
fn safe_equal(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a
        .as_bytes()
        .iter()
        .zip(b.as_bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));
    diff == 0
}

/// Amounts are signed as strings; only an all-zero fraction is accepted.
fn parse_gross_amount(raw: &str) -> Result<i64, BillingError> {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty() || !fraction.bytes().all(|b| b == b'0') {
        return Err(BillingError::UnknownAmount(raw.to_string()));
    }
    whole
        .parse::<i64>()
        .map_err(|_| BillingError::UnknownAmount(raw.to_string()))
}

/// Map the provider's status vocabulary onto the per-order state machine.
fn classify(
    transaction_status: &str,
    fraud_status: Option<&str>,
) -> Result<PaymentStatus, BillingError> {
    match (transaction_status, fraud_status) {
        ("settlement", _) => Ok(PaymentStatus::Success),
        ("capture", Some("accept")) => Ok(PaymentStatus::Success),
        ("capture", Some("challenge")) => Ok(PaymentStatus::Challenge),
        ("deny" | "cancel" | "expire" | "failure", _) => Ok(PaymentStatus::Failed),
        ("pending", _) => Ok(PaymentStatus::Pending),
        (status, fraud) => Err(BillingError::UnknownStatus(match fraud {
            Some(fraud) => format!("{status}/{fraud}"),
            None => status.to_string(),
        })),
    }
}

/// Verify and apply one provider notification.
///
/// Verification order: signature first, then order id, amount, and status;
/// a payload that fails any of these writes nothing. Replays of an order
/// already in a terminal status are reported back without touching the
/// store, so a repeated `settlement` cannot move the expiry again.
pub async fn handle_notification(
    store: &dyn ControlStore,
    raw: &str,
    server_key: &str,
    now_ms: i64,
) -> Result<NotificationResult, BillingError> {
    let notification: PaymentNotification = serde_json::from_str(raw)?;

    let expected = compute_signature(
        &notification.order_id,
        &notification.status_code,
        &notification.gross_amount,
        server_key,
    );
    if !safe_equal(&expected, &notification.signature_key) {
        return Err(BillingError::Signature);
    }

    let order = parse_order_id(&notification.order_id)?;
    let amount = parse_gross_amount(&notification.gross_amount)?;
    let plan = plan_for_amount(amount)?;
    let status = classify(
        &notification.transaction_status,
        notification.fraud_status.as_deref(),
    )?;

    if let Some(existing) = store.get_payment(&notification.order_id).await?
        && existing.status.is_terminal()
    {
        debug!(order_id = %notification.order_id, status = %existing.status,
               "terminal order replayed, nothing to do");
        return Ok(NotificationResult {
            order_id: notification.order_id,
            user_id: existing.user_id,
            status: existing.status,
            replayed: true,
        });
    }

    let record = PaymentRecord {
        order_id: notification.order_id,
        user_id: order.user_id,
        amount,
        plan,
        status,
        created_at: now_ms,
        updated_at: now_ms,
    };

    match status {
        PaymentStatus::Success => {
            let expires_at = now_ms + SUBSCRIPTION_PERIOD_MS;
            let activation = store
                .apply_payment_success(&record, expires_at, now_ms)
                .await?;
            info!(order_id = %record.order_id, user_id = %record.user_id, plan = %plan,
                  activated = activation.activate.len(),
                  deactivated = activation.deactivate.len(),
                  "payment settled");
        }
        PaymentStatus::Failed | PaymentStatus::Challenge | PaymentStatus::Pending => {
            store.record_payment(&record).await?;
            debug!(order_id = %record.order_id, status = %status, "payment recorded");
        }
    }

    Ok(NotificationResult {
        order_id: record.order_id,
        user_id: record.user_id,
        status,
        replayed: false,
    })
}

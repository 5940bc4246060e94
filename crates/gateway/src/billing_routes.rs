//! Payment-provider webhook endpoint.
//!
//! The path slug is a shared secret; it gates the surface before the body
//! is read. Signature verification happens inside the billing handler. The
//! provider retries on any non-2xx, so understood-but-rejected payment
//! outcomes (failed, challenge, replays) still answer 200.

use {
    axum::{
        extract::{Path, State},
        response::{IntoResponse, Json, Response},
    },
    secrecy::ExposeSecret,
    tracing::warn,
};

use {
    mirrorplane_billing::{BillingError, handle_notification},
    mirrorplane_common::time::now_ms,
};

use crate::{auth::safe_equal, error::ApiError, state::AppState};

pub async fn payment_webhook(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: String,
) -> Response {
    let (Some(expected_slug), Some(server_key)) = (
        state.billing.webhook_slug.as_ref(),
        state.billing.server_key.as_ref(),
    ) else {
        warn!("payment webhook hit but billing is not configured");
        return ApiError::Forbidden.into_response();
    };
    if !safe_equal(&slug, expected_slug.expose_secret()) {
        warn!("payment webhook rejected: slug mismatch");
        return ApiError::Forbidden.into_response();
    }

    match handle_notification(
        state.store.as_ref(),
        &body,
        server_key.expose_secret(),
        now_ms(),
    )
    .await
    {
        Ok(result) => Json(result).into_response(),
        Err(BillingError::Signature) => {
            warn!("payment notification rejected: signature mismatch");
            ApiError::Forbidden.into_response()
        },
        Err(
            err @ (BillingError::Payload(_)
            | BillingError::MalformedOrder(_)
            | BillingError::UnknownAmount(_)
            | BillingError::UnknownStatus(_)),
        ) => ApiError::Validation(err.to_string()).into_response(),
        Err(BillingError::Store(err)) => ApiError::internal(err).into_response(),
    }
}

//! HTTP error surface for the control API.

use {
    axum::{
        http::StatusCode,
        response::{IntoResponse, Json, Response},
    },
    serde_json::json,
    thiserror::Error,
};

use {mirrorplane_entitlement::EntitlementError, mirrorplane_store::StoreError};

/// Everything a handler can fail with, mapped onto the wire in
/// [`IntoResponse`].
///
/// Not-found never distinguishes "absent" from "owned by someone else", so
/// ids cannot be enumerated through the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input shape or an out-of-range field. The detail names the
    /// offending field.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid bearer token.
    #[error("not authenticated")]
    Unauthorized,

    /// A failed shared-secret check. No detail leaves the server.
    #[error("forbidden")]
    Forbidden,

    /// Entity absent or not owned by the caller.
    #[error("not found")]
    NotFound,

    /// Plan quota reached. Carries the limit so a UI can prompt an upgrade.
    #[error("active mirror quota reached")]
    QuotaExceeded { limit: usize },

    /// The current plan does not cover the requested feature.
    #[error("{0}")]
    PlanRestricted(String),

    /// Store or crypto failure. The detail goes to the log, not the wire.
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    /// Wraps any displayable failure as an internal error.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Validation(detail) => Self::Validation(detail),
            StoreError::Entitlement(EntitlementError::QuotaExceeded { limit }) => {
                Self::QuotaExceeded { limit }
            },
            StoreError::Entitlement(err @ EntitlementError::PlatformNotAllowed { .. }) => {
                Self::PlanRestricted(err.to_string())
            },
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(detail) => (StatusCode::BAD_REQUEST, json!({ "error": detail })),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "not authenticated" }),
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "forbidden" })),
            Self::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "not found" })),
            Self::QuotaExceeded { limit } => (
                StatusCode::PAYMENT_REQUIRED,
                json!({ "error": "active mirror quota reached", "quota": limit }),
            ),
            Self::PlanRestricted(detail) => {
                (StatusCode::PAYMENT_REQUIRED, json!({ "error": detail }))
            },
            Self::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal error" }),
                )
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {
        axum::{http::StatusCode, response::IntoResponse},
        mirrorplane_entitlement::{EntitlementError, Platform},
        mirrorplane_store::StoreError,
    };

    use super::ApiError;

    #[test]
    fn store_errors_map_onto_the_wire_taxonomy() {
        assert!(matches!(
            ApiError::from(StoreError::NotFound),
            ApiError::NotFound
        ));
        assert!(matches!(
            ApiError::from(StoreError::Validation("cost must be at least 1".into())),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Entitlement(EntitlementError::QuotaExceeded {
                limit: 2
            })),
            ApiError::QuotaExceeded { limit: 2 }
        ));
        assert!(matches!(
            ApiError::from(StoreError::Entitlement(
                EntitlementError::PlatformNotAllowed {
                    platform: Platform::Telegram
                }
            )),
            ApiError::PlanRestricted(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Corrupt("bad payment status".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn status_codes_follow_the_error_class() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (
                ApiError::QuotaExceeded { limit: 1 },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                ApiError::PlanRestricted("telegram needs pro".into()),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                ApiError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}

//! Bearer-token checks for the admin and report surfaces.
//!
//! Tokens are static strings from config. A surface whose token is not
//! configured rejects every request rather than falling open.

use {
    axum::{
        body::Body,
        extract::State,
        http::{HeaderMap, Request, header},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    secrecy::{ExposeSecret, Secret},
};

use mirrorplane_config::AuthConfig;

use crate::{error::ApiError, state::AppState};

pub struct GatewayAuth {
    admin_token: Option<Secret<String>>,
    report_token: Option<Secret<String>>,
}

impl GatewayAuth {
    #[must_use]
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            admin_token: auth.admin_token.clone(),
            report_token: auth.report_token.clone(),
        }
    }

    pub fn check_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        check_bearer(headers, self.admin_token.as_ref())
    }

    pub fn check_report(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        check_bearer(headers, self.report_token.as_ref())
    }
}

fn check_bearer(headers: &HeaderMap, expected: Option<&Secret<String>>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Err(ApiError::Unauthorized);
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match presented {
        Some(token) if safe_equal(token, expected.expose_secret()) => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

/// Constant-time string comparison for tokens and slugs.
pub(crate) fn safe_equal(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Middleware guarding the admin API.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match state.auth.check_admin(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

/// Middleware guarding the abuse-report endpoint.
pub async fn require_report(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match state.auth.check_report(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};

    use super::*;

    fn headers_with_bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn auth_with_admin(token: &str) -> GatewayAuth {
        GatewayAuth {
            admin_token: Some(Secret::new(token.to_string())),
            report_token: None,
        }
    }

    #[test]
    fn correct_bearer_token_passes() {
        let auth = auth_with_admin("admin-tok");
        assert!(auth.check_admin(&headers_with_bearer("admin-tok")).is_ok());
    }

    #[test]
    fn wrong_or_missing_bearer_is_rejected() {
        let auth = auth_with_admin("admin-tok");
        assert!(matches!(
            auth.check_admin(&headers_with_bearer("nope")),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            auth.check_admin(&HeaderMap::new()),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn unconfigured_surface_rejects_everything() {
        let auth = auth_with_admin("admin-tok");
        assert!(matches!(
            auth.check_report(&headers_with_bearer("anything")),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn safe_equal_compares_exact_bytes() {
        assert!(safe_equal("abc", "abc"));
        assert!(!safe_equal("abc", "abd"));
        assert!(!safe_equal("abc", "abcd"));
        assert!(!safe_equal("", "a"));
        assert!(safe_equal("", ""));
    }
}

//! Per-client throttling for mutating endpoints.
//!
//! Fixed 60-second windows keyed by client ip. The gate runs before auth so
//! unauthenticated floods are counted too. Read-only requests pass
//! unthrottled.

use {
    std::{
        net::{IpAddr, SocketAddr},
        sync::atomic::{AtomicU64, Ordering},
        time::{Duration, Instant},
    },
    tracing::debug,
};

use {
    axum::{
        extract::{ConnectInfo, State},
        http::{Method, StatusCode},
        middleware::Next,
        response::{IntoResponse, Json, Response},
    },
    dashmap::{DashMap, mapref::entry::Entry},
};

use crate::state::AppState;

/// Fixed throttle window.
pub const WINDOW: Duration = Duration::from_secs(60);

const CLEANUP_EVERY_ACTIONS: u64 = 512;

/// Outcome of recording one action against an actor's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Denied { retry_after: Duration },
}

/// Counter backend for the mutation throttle.
///
/// The trait seam lets a shared backend replace the in-process one without
/// touching the gate.
pub trait ThrottleStore: Send + Sync {
    /// Records one action by `actor` and decides whether it may proceed.
    fn check(&self, actor: IpAddr) -> ThrottleDecision;
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    started_at: Instant,
    count: u32,
}

/// Dashmap-backed fixed-window counters. State does not survive a restart,
/// which is acceptable for abuse throttling.
pub struct MemoryThrottleStore {
    max_actions: u32,
    buckets: DashMap<IpAddr, WindowState>,
    actions_seen: AtomicU64,
}

impl MemoryThrottleStore {
    #[must_use]
    pub fn new(max_actions: u32) -> Self {
        Self {
            max_actions,
            buckets: DashMap::new(),
            actions_seen: AtomicU64::new(0),
        }
    }

    fn check_at(&self, actor: IpAddr, now: Instant) -> ThrottleDecision {
        if self.max_actions == 0 {
            return ThrottleDecision::Denied { retry_after: WINDOW };
        }

        let decision = match self.buckets.entry(actor) {
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                let elapsed = now.duration_since(state.started_at);
                if elapsed >= WINDOW {
                    state.started_at = now;
                    state.count = 1;
                    ThrottleDecision::Allowed
                } else if state.count < self.max_actions {
                    state.count += 1;
                    ThrottleDecision::Allowed
                } else {
                    ThrottleDecision::Denied {
                        retry_after: WINDOW.saturating_sub(elapsed),
                    }
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(WindowState {
                    started_at: now,
                    count: 1,
                });
                ThrottleDecision::Allowed
            },
        };

        self.cleanup_if_needed(now);
        decision
    }

    fn cleanup_if_needed(&self, now: Instant) {
        let seen = self.actions_seen.fetch_add(1, Ordering::Relaxed) + 1;
        if !seen.is_multiple_of(CLEANUP_EVERY_ACTIONS) {
            return;
        }
        let stale_after = WINDOW.saturating_mul(3);
        self.buckets
            .retain(|_, state| now.duration_since(state.started_at) <= stale_after);
    }
}

impl ThrottleStore for MemoryThrottleStore {
    fn check(&self, actor: IpAddr) -> ThrottleDecision {
        self.check_at(actor, Instant::now())
    }
}

fn is_throttled(method: &Method, path: &str) -> bool {
    path.starts_with("/api/") && matches!(*method, Method::POST | Method::PUT | Method::DELETE)
}

/// Middleware applying the mutation throttle.
pub async fn throttle_gate(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if !is_throttled(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    match state.throttle.check(addr.ip()) {
        ThrottleDecision::Allowed => next.run(request).await,
        ThrottleDecision::Denied { retry_after } => {
            debug!(client = %addr.ip(), path = %request.uri().path(), "mutation throttled");
            rate_limited_response(retry_after)
        },
    }
}

fn rate_limited_response(retry_after: Duration) -> Response {
    let retry_after_secs = retry_after.as_secs().max(1);
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "too many requests",
            "retry_after_seconds": retry_after_secs
        })),
    )
        .into_response();

    if let Ok(value) = retry_after_secs.to_string().parse() {
        response
            .headers_mut()
            .insert(axum::http::header::RETRY_AFTER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    const ACTOR: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9));
    const OTHER: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 10));

    #[test]
    fn allows_up_to_the_limit_then_denies() {
        let store = MemoryThrottleStore::new(3);
        let now = Instant::now();
        for _ in 0..3 {
            assert_eq!(store.check_at(ACTOR, now), ThrottleDecision::Allowed);
        }
        assert!(matches!(
            store.check_at(ACTOR, now),
            ThrottleDecision::Denied { .. }
        ));
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let store = MemoryThrottleStore::new(1);
        let now = Instant::now();
        assert_eq!(store.check_at(ACTOR, now), ThrottleDecision::Allowed);
        assert!(matches!(
            store.check_at(ACTOR, now + Duration::from_secs(59)),
            ThrottleDecision::Denied { .. }
        ));
        assert_eq!(
            store.check_at(ACTOR, now + WINDOW),
            ThrottleDecision::Allowed
        );
    }

    #[test]
    fn actors_are_counted_independently() {
        let store = MemoryThrottleStore::new(1);
        let now = Instant::now();
        assert_eq!(store.check_at(ACTOR, now), ThrottleDecision::Allowed);
        assert_eq!(store.check_at(OTHER, now), ThrottleDecision::Allowed);
    }

    #[test]
    fn retry_after_never_exceeds_the_window() {
        let store = MemoryThrottleStore::new(1);
        let now = Instant::now();
        store.check_at(ACTOR, now);
        let denied = store.check_at(ACTOR, now + Duration::from_secs(20));
        match denied {
            ThrottleDecision::Denied { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(40));
            },
            ThrottleDecision::Allowed => panic!("expected a denial"),
        }
    }

    #[test]
    fn zero_limit_denies_immediately() {
        let store = MemoryThrottleStore::new(0);
        assert!(matches!(
            store.check_at(ACTOR, Instant::now()),
            ThrottleDecision::Denied { .. }
        ));
    }

    #[test]
    fn only_mutating_api_requests_are_throttled() {
        assert!(is_throttled(&Method::POST, "/api/bots"));
        assert!(is_throttled(&Method::PUT, "/api/bots/b1/features"));
        assert!(is_throttled(&Method::DELETE, "/api/mirrors/m1"));
        assert!(!is_throttled(&Method::GET, "/api/bots"));
        assert!(!is_throttled(&Method::POST, "/hooks/payment/slug"));
        assert!(!is_throttled(&Method::GET, "/health"));
    }
}

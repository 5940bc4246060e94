//! HTTP control surface for the mirrorplane fleet.
//!
//! Three authentication domains share one router: the bearer-token admin
//! API, the bearer-token abuse-report endpoint, and the payment webhook
//! keyed by a URL-embedded slug. Mutating requests pass a per-client
//! throttle before any token is checked.

pub mod auth;
pub mod billing_routes;
pub mod bot_routes;
pub mod error;
pub mod fleet_routes;
pub mod mirror_routes;
pub mod report_routes;
pub mod server;
pub mod state;
pub mod throttle;

pub use {
    error::ApiError,
    server::{build_control_app, start_control_plane},
    state::AppState,
    throttle::{MemoryThrottleStore, ThrottleDecision, ThrottleStore},
};

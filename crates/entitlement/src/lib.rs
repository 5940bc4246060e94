//! Plan tiers, quotas, and capability policy for the mirror fleet.
//!
//! Everything in this crate is pure: callers pass in the current state and
//! get back a decision or a plan to apply. Persistence and enforcement live
//! in `mirrorplane-store` and `mirrorplane-gateway`.

pub mod capability;
pub mod error;
pub mod plan;
pub mod reconcile;

pub use {
    capability::{Capability, CapabilitySet, close_over_dependencies},
    error::EntitlementError,
    plan::{PlanQuota, PlanTier, Platform, quota_for},
    reconcile::{ActivationPlan, MirrorCandidate, reconcile_activation},
};

//! Full re-derivation of which mirror paths should be active for a user.
//!
//! This never computes a delta from the event that triggered it. Every run
//! starts from the complete list of paths plus the effective tier, so an
//! earlier missed event cannot leave the activation state permanently wrong.

use crate::plan::{PlanTier, Platform, quota_for};

/// One mirror path as the reconciler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorCandidate {
    pub id: String,
    pub platform: Platform,
    pub active: bool,
    pub created_at: i64,
}

/// Flips to apply. Paths not named keep their current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationPlan {
    /// Ids to set active, oldest first.
    pub activate: Vec<String>,
    /// Ids to set inactive.
    pub deactivate: Vec<String>,
}

impl ActivationPlan {
    pub fn is_noop(&self) -> bool {
        self.activate.is_empty() && self.deactivate.is_empty()
    }
}

/// Derives the activation plan for one user's mirror paths under `tier`.
///
/// Eligible paths are those whose platform the tier covers. The oldest
/// `max_active_mirrors` eligible paths (by `created_at`, then `id` as the
/// tie-break) end up active; every other path ends up inactive. Running the
/// result through this function again yields a no-op plan.
pub fn reconcile_activation(mirrors: &[MirrorCandidate], tier: PlanTier) -> ActivationPlan {
    let quota = quota_for(tier);

    let mut eligible: Vec<&MirrorCandidate> = mirrors
        .iter()
        .filter(|m| quota.allows(m.platform))
        .collect();
    eligible.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

    let mut plan = ActivationPlan::default();
    let keep: Vec<&str> = eligible
        .iter()
        .take(quota.max_active_mirrors)
        .map(|m| m.id.as_str())
        .collect();

    for m in &eligible[..keep.len()] {
        if !m.active {
            plan.activate.push(m.id.clone());
        }
    }
    for m in mirrors {
        if m.active && !keep.contains(&m.id.as_str()) {
            plan.deactivate.push(m.id.clone());
        }
    }
    plan
}

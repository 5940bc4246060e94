use thiserror::Error;

use crate::plan::Platform;

/// Errors returned by entitlement checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntitlementError {
    /// A plan name that is not one of the known tiers.
    #[error("unknown plan tier: {0}")]
    UnknownPlan(String),

    /// A capability tag that is not part of the declared set.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// A platform name that is not one of the mirrored platforms.
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    /// Activating one more mirror path would exceed the plan quota.
    #[error("active mirror quota reached ({limit})")]
    QuotaExceeded { limit: usize },

    /// The mirror path's platform is not covered by the plan.
    #[error("platform {platform} is not available on the current plan")]
    PlatformNotAllowed { platform: Platform },
}

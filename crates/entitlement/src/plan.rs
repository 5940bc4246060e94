//! Plan tiers and the quota table derived from them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EntitlementError;

/// Messaging platform a mirror path reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Discord,
    Telegram,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Telegram => "telegram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = EntitlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discord" => Ok(Self::Discord),
            "telegram" => Ok(Self::Telegram),
            other => Err(EntitlementError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Subscription tier. Variant order is the upgrade order, so `Ord`
/// comparisons answer "is this at least Pro?" directly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Starter,
    Pro,
    Elite,
}

impl PlanTier {
    pub const ALL: &'static [PlanTier] = &[Self::Free, Self::Starter, Self::Pro, Self::Elite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Elite => "elite",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = EntitlementError;

    /// Case-insensitive parse. Callers sit at trust boundaries (webhook
    /// payloads, stored rows), so an unknown tier is a hard error rather
    /// than a silent downgrade to [`PlanTier::Free`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "starter" => Ok(Self::Starter),
            "pro" => Ok(Self::Pro),
            "elite" => Ok(Self::Elite),
            other => Err(EntitlementError::UnknownPlan(other.to_string())),
        }
    }
}

/// Per-tier limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanQuota {
    /// How many mirror paths may be active at once.
    pub max_active_mirrors: usize,
    /// Which source platforms the tier may mirror from.
    pub platforms: &'static [Platform],
}

impl PlanQuota {
    pub fn allows(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }
}

const DISCORD_ONLY: &[Platform] = &[Platform::Discord];
const ALL_PLATFORMS: &[Platform] = &[Platform::Discord, Platform::Telegram];

/// The quota table. Total over all tiers; there is no fallback row.
pub fn quota_for(tier: PlanTier) -> PlanQuota {
    match tier {
        PlanTier::Free => PlanQuota {
            max_active_mirrors: 1,
            platforms: DISCORD_ONLY,
        },
        PlanTier::Starter => PlanQuota {
            max_active_mirrors: 2,
            platforms: DISCORD_ONLY,
        },
        PlanTier::Pro => PlanQuota {
            max_active_mirrors: 5,
            platforms: ALL_PLATFORMS,
        },
        PlanTier::Elite => PlanQuota {
            max_active_mirrors: 10,
            platforms: ALL_PLATFORMS,
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn tiers_order_by_upgrade_path() {
        assert!(PlanTier::Free < PlanTier::Starter);
        assert!(PlanTier::Starter < PlanTier::Pro);
        assert!(PlanTier::Pro < PlanTier::Elite);
    }

    #[rstest]
    #[case(PlanTier::Free, 1, false)]
    #[case(PlanTier::Starter, 2, false)]
    #[case(PlanTier::Pro, 5, true)]
    #[case(PlanTier::Elite, 10, true)]
    fn quota_table(#[case] tier: PlanTier, #[case] max: usize, #[case] telegram: bool) {
        let quota = quota_for(tier);
        assert_eq!(quota.max_active_mirrors, max);
        assert!(quota.allows(Platform::Discord));
        assert_eq!(quota.allows(Platform::Telegram), telegram);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("PRO".parse::<PlanTier>().unwrap(), PlanTier::Pro);
        assert_eq!("elite".parse::<PlanTier>().unwrap(), PlanTier::Elite);
        assert_eq!("Starter".parse::<PlanTier>().unwrap(), PlanTier::Starter);
    }

    #[test]
    fn unknown_plan_is_an_error() {
        let err = "platinum".parse::<PlanTier>().unwrap_err();
        assert_eq!(err, EntitlementError::UnknownPlan("platinum".to_string()));
    }

    #[test]
    fn tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PlanTier::Elite).unwrap(), "\"elite\"");
        let parsed: PlanTier = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(parsed, PlanTier::Pro);
    }
}

//! Entities persisted by the control plane.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use mirrorplane_entitlement::{CapabilitySet, PlanTier, Platform};

// ── Bots ────────────────────────────────────────────────────────────────────

/// One worker bot bound to an external messaging account and guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: String,
    pub name: String,
    pub client_id: String,
    /// Vault blob; never stored or returned as plaintext.
    pub token_sealed: String,
    pub guild_id: String,
    pub admin_role_id: Option<String>,
    pub trial_role_id: Option<String>,
    pub features: CapabilitySet,
    pub active: bool,
    pub last_heartbeat_at: Option<i64>,
    pub reconcile_at: i64,
    pub created_at: i64,
}

/// Fields supplied when registering a bot. The store assigns id, timestamps,
/// and the initial reconcile signal.
#[derive(Debug, Clone)]
pub struct NewBot {
    pub name: String,
    pub client_id: String,
    pub token_sealed: String,
    pub guild_id: String,
    pub admin_role_id: Option<String>,
    pub trial_role_id: Option<String>,
    pub features: CapabilitySet,
}

impl NewBot {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.client_id.trim().is_empty() {
            return Err("client_id must not be empty".into());
        }
        if self.guild_id.trim().is_empty() {
            return Err("guild_id must not be empty".into());
        }
        if self.token_sealed.is_empty() {
            return Err("token must not be empty".into());
        }
        Ok(())
    }
}

// ── Point configuration ─────────────────────────────────────────────────────

/// Per-bot message economy settings. Upserts replace the whole row; there is
/// no partial merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointConfig {
    pub points_per_message: u32,
    pub cooldown_secs: u32,
    /// Channel ids the economy applies to; empty means every channel.
    #[serde(default)]
    pub channels: Vec<String>,
}

impl PointConfig {
    pub const POINTS_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
    pub const COOLDOWN_RANGE: std::ops::RangeInclusive<u32> = 0..=3600;

    pub fn validate(&self) -> Result<(), String> {
        if !Self::POINTS_RANGE.contains(&self.points_per_message) {
            return Err("points_per_message must be between 1 and 100".into());
        }
        if !Self::COOLDOWN_RANGE.contains(&self.cooldown_secs) {
            return Err("cooldown_secs must be between 0 and 3600".into());
        }
        Ok(())
    }
}

// ── Redeem items ────────────────────────────────────────────────────────────

/// A role purchasable with accumulated points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedeemItem {
    pub id: String,
    pub bot_id: String,
    pub role_id: String,
    pub role_name: String,
    pub cost: i64,
    pub duration_days: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewRedeemItem {
    pub bot_id: String,
    pub role_id: String,
    pub role_name: String,
    pub cost: i64,
    pub duration_days: i64,
}

impl NewRedeemItem {
    pub fn validate(&self) -> Result<(), String> {
        if self.role_id.trim().is_empty() {
            return Err("role_id must not be empty".into());
        }
        if self.role_name.trim().is_empty() {
            return Err("role_name must not be empty".into());
        }
        if self.cost < 1 {
            return Err("cost must be at least 1".into());
        }
        if self.duration_days < 1 {
            return Err("duration_days must be at least 1".into());
        }
        Ok(())
    }
}

// ── Mirror paths ────────────────────────────────────────────────────────────

/// One source the per-user mirror worker reads from.
///
/// Paths may exist inactive in any number; the active count is what the plan
/// quota bounds, enforced when a path is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorPath {
    pub id: String,
    pub user_id: String,
    pub platform: Platform,
    /// Vault blob for the source-account credential.
    pub source_sealed: String,
    /// Sender ids whose messages are dropped. Ordered, duplicate-free.
    pub blacklist: Vec<String>,
    pub active: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewMirrorPath {
    pub user_id: String,
    pub platform: Platform,
    pub source_sealed: String,
}

impl NewMirrorPath {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("user_id must not be empty".into());
        }
        if self.source_sealed.is_empty() {
            return Err("source_credential must not be empty".into());
        }
        Ok(())
    }
}

// ── Subscriptions ───────────────────────────────────────────────────────────

/// A user's paid tier. Expiry is evaluated at read time; the stored tier is
/// never rewritten by the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub user_id: String,
    pub tier: PlanTier,
    pub expires_at: Option<i64>,
}

impl Subscription {
    /// The tier entitlement checks should use at `now_ms`. A lapsed expiry
    /// degrades to [`PlanTier::Free`] without mutating the row.
    pub fn effective_tier(&self, now_ms: i64) -> PlanTier {
        match self.expires_at {
            Some(expires_at) if expires_at <= now_ms => PlanTier::Free,
            _ => self.tier,
        }
    }

    /// The default for users with no stored row.
    pub fn free(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            tier: PlanTier::Free,
            expires_at: None,
        }
    }
}

// ── Payments ────────────────────────────────────────────────────────────────

/// Provider-facing payment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    /// Flagged by fraud review; a follow-up notification resolves it.
    Challenge,
}

impl PaymentStatus {
    /// Terminal states ignore further notifications for the same order.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Challenge => "challenge",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "challenge" => Ok(Self::Challenge),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// One order as seen through provider notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRecord {
    /// `DISBOT-<userId>-<timestamp>`; round-trips through the order codec.
    pub order_id: String,
    pub user_id: String,
    /// Whole currency units, matched exactly against the price table.
    pub amount: i64,
    pub plan: PlanTier,
    pub status: PaymentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

// ── Maintenance ─────────────────────────────────────────────────────────────

/// Result of a legacy-secret sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub bots_resealed: usize,
    pub mirrors_resealed: usize,
}

impl MigrationReport {
    pub fn total(&self) -> usize {
        self.bots_resealed + self.mirrors_resealed
    }
}

//! Persistence trait for control-plane state.

use {async_trait::async_trait, mirrorplane_vault::Vault};

use {
    crate::{
        Result,
        types::{
            BotIdentity, MigrationReport, MirrorPath, NewBot, NewMirrorPath, NewRedeemItem,
            PaymentRecord, PointConfig, RedeemItem, Subscription,
        },
    },
    mirrorplane_entitlement::{ActivationPlan, CapabilitySet, PlanTier},
};

/// Persistence backend for bots, mirror paths, entitlements, and payments.
///
/// Mutating methods take the caller's clock so signal arithmetic stays
/// testable. Any method that changes worker-visible configuration advances
/// the affected row's `reconcile_at` in the same transaction.
#[async_trait]
pub trait ControlStore: Send + Sync {
    // ── Bots ────────────────────────────────────────────────────────────

    async fn create_bot(&self, new: NewBot, now_ms: i64) -> Result<BotIdentity>;
    async fn get_bot(&self, id: &str) -> Result<BotIdentity>;
    async fn list_bots(&self) -> Result<Vec<BotIdentity>>;
    /// Removes the bot together with its point config and redeem items.
    async fn delete_bot(&self, id: &str) -> Result<()>;
    /// Replaces the capability set. Callers pass an already-closed set.
    async fn set_bot_features(
        &self,
        id: &str,
        features: CapabilitySet,
        now_ms: i64,
    ) -> Result<BotIdentity>;
    async fn set_bot_token(&self, id: &str, token_sealed: &str, now_ms: i64) -> Result<()>;
    async fn set_bot_active(&self, id: &str, active: bool, now_ms: i64) -> Result<()>;
    /// Worker-written liveness mark. Does not touch the reconcile signal.
    async fn record_heartbeat(&self, bot_id: &str, now_ms: i64) -> Result<()>;

    // ── Point configuration ─────────────────────────────────────────────

    /// Creates or fully replaces the bot's point config.
    async fn upsert_point_config(
        &self,
        bot_id: &str,
        config: &PointConfig,
        now_ms: i64,
    ) -> Result<()>;
    async fn get_point_config(&self, bot_id: &str) -> Result<Option<PointConfig>>;

    // ── Redeem items ────────────────────────────────────────────────────

    async fn create_redeem_item(&self, new: NewRedeemItem, now_ms: i64) -> Result<RedeemItem>;
    async fn list_redeem_items(&self, bot_id: &str) -> Result<Vec<RedeemItem>>;
    async fn delete_redeem_item(&self, bot_id: &str, redeem_id: &str, now_ms: i64) -> Result<()>;

    // ── Mirror paths ────────────────────────────────────────────────────

    /// Creates the path inactive; activation is a separate, quota-gated step.
    async fn create_mirror_path(&self, new: NewMirrorPath, now_ms: i64) -> Result<MirrorPath>;
    async fn get_mirror_path(&self, id: &str) -> Result<MirrorPath>;
    /// Ordered by (created_at, id), the same order activation uses.
    async fn list_mirror_paths(&self, user_id: &str) -> Result<Vec<MirrorPath>>;
    async fn delete_mirror_path(&self, id: &str, now_ms: i64) -> Result<()>;
    /// Current value of the user's mirror-config signal; `0` before any
    /// path has ever been written.
    async fn get_mirror_signal(&self, user_id: &str) -> Result<i64>;
    /// Flips the path active after checking platform and quota against the
    /// user's effective tier, all inside one transaction. Already-active
    /// paths are a no-op.
    async fn activate_mirror_path(&self, id: &str, now_ms: i64) -> Result<MirrorPath>;
    async fn deactivate_mirror_path(&self, id: &str, now_ms: i64) -> Result<MirrorPath>;
    /// Adds `sender_id` to the path's blacklist if absent. Returns whether
    /// anything changed; re-reports never grow the list or bump the signal.
    async fn add_to_blacklist(&self, path_id: &str, sender_id: &str, now_ms: i64) -> Result<bool>;
    /// Re-derives the user's activation state from scratch and applies the
    /// flips. Safe to run at any time.
    async fn reconcile_user_mirrors(&self, user_id: &str, now_ms: i64) -> Result<ActivationPlan>;

    // ── Subscriptions ───────────────────────────────────────────────────

    /// Missing rows read as the free tier.
    async fn get_subscription(&self, user_id: &str) -> Result<Subscription>;
    /// Sets the tier and expiry, then reconciles the user's mirrors in the
    /// same transaction.
    async fn set_subscription(
        &self,
        user_id: &str,
        tier: PlanTier,
        expires_at: Option<i64>,
        now_ms: i64,
    ) -> Result<ActivationPlan>;

    // ── Payments ────────────────────────────────────────────────────────

    async fn get_payment(&self, order_id: &str) -> Result<Option<PaymentRecord>>;
    /// Upserts the record as-is. Used for pending, failed, and challenge
    /// outcomes that touch nothing else.
    async fn record_payment(&self, record: &PaymentRecord) -> Result<()>;
    /// Success path: payment record, subscription change, and activation
    /// flips committed as one transaction.
    async fn apply_payment_success(
        &self,
        record: &PaymentRecord,
        expires_at: i64,
        now_ms: i64,
    ) -> Result<ActivationPlan>;

    // ── Maintenance ─────────────────────────────────────────────────────

    /// Seals any credential column still holding legacy plaintext. Values
    /// are unchanged after decryption, so no reconcile signals move.
    async fn migrate_plaintext_secrets(&self, vault: &Vault) -> Result<MigrationReport>;
}

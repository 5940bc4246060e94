//! SQLite-backed control store using sqlx.

use {
    async_trait::async_trait,
    sqlx::{SqliteConnection, SqlitePool, sqlite::SqlitePoolOptions},
    tracing::info,
};

use {
    mirrorplane_common::id::new_id,
    mirrorplane_entitlement::{
        ActivationPlan, CapabilitySet, EntitlementError, MirrorCandidate, PlanTier, Platform,
        quota_for, reconcile_activation,
    },
    mirrorplane_vault::{Vault, looks_sealed},
};

use crate::{
    Result,
    error::StoreError,
    store::ControlStore,
    types::{
        BotIdentity, MigrationReport, MirrorPath, NewBot, NewMirrorPath, NewRedeemItem,
        PaymentRecord, PaymentStatus, PointConfig, RedeemItem, Subscription,
    },
};

// ── Row types ───────────────────────────────────────────────────────────────

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct BotRow {
    id: String,
    name: String,
    client_id: String,
    token_sealed: String,
    guild_id: String,
    admin_role_id: Option<String>,
    trial_role_id: Option<String>,
    features: String,
    active: bool,
    last_heartbeat_at: Option<i64>,
    reconcile_at: i64,
    created_at: i64,
}

impl TryFrom<BotRow> for BotIdentity {
    type Error = StoreError;

    fn try_from(r: BotRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            name: r.name,
            client_id: r.client_id,
            token_sealed: r.token_sealed,
            guild_id: r.guild_id,
            admin_role_id: r.admin_role_id,
            trial_role_id: r.trial_role_id,
            features: serde_json::from_str::<CapabilitySet>(&r.features)?,
            active: r.active,
            last_heartbeat_at: r.last_heartbeat_at,
            reconcile_at: r.reconcile_at,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MirrorRow {
    id: String,
    user_id: String,
    platform: String,
    source_sealed: String,
    blacklist: String,
    active: bool,
    created_at: i64,
}

impl TryFrom<MirrorRow> for MirrorPath {
    type Error = StoreError;

    fn try_from(r: MirrorRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            platform: r.platform.parse::<Platform>()?,
            source_sealed: r.source_sealed,
            blacklist: serde_json::from_str(&r.blacklist)?,
            active: r.active,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RedeemRow {
    id: String,
    bot_id: String,
    role_id: String,
    role_name: String,
    cost: i64,
    duration_days: i64,
    is_active: bool,
}

impl From<RedeemRow> for RedeemItem {
    fn from(r: RedeemRow) -> Self {
        Self {
            id: r.id,
            bot_id: r.bot_id,
            role_id: r.role_id,
            role_name: r.role_name,
            cost: r.cost,
            duration_days: r.duration_days,
            is_active: r.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PointRow {
    points_per_message: i64,
    cooldown_secs: i64,
    channels: String,
}

impl TryFrom<PointRow> for PointConfig {
    type Error = StoreError;

    fn try_from(r: PointRow) -> Result<Self> {
        Ok(Self {
            points_per_message: r.points_per_message as u32,
            cooldown_secs: r.cooldown_secs as u32,
            channels: serde_json::from_str(&r.channels)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    user_id: String,
    tier: String,
    expires_at: Option<i64>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = StoreError;

    fn try_from(r: SubscriptionRow) -> Result<Self> {
        Ok(Self {
            user_id: r.user_id,
            tier: r.tier.parse::<PlanTier>()?,
            expires_at: r.expires_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    order_id: String,
    user_id: String,
    amount: i64,
    plan: String,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = StoreError;

    fn try_from(r: PaymentRow) -> Result<Self> {
        Ok(Self {
            order_id: r.order_id,
            user_id: r.user_id,
            amount: r.amount,
            plan: r.plan.parse::<PlanTier>()?,
            status: r.status.parse::<PaymentStatus>().map_err(StoreError::Corrupt)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

// ── Store ───────────────────────────────────────────────────────────────────

/// SQLite-backed persistence for the whole control plane.
pub struct SqliteControlStore {
    pool: SqlitePool,
}

impl SqliteControlStore {
    /// Create a store with its own connection pool and initialize the schema.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::init(&pool).await?;
        Ok(Self { pool })
    }

    /// Create a store using an existing pool. [`Self::init`] must already
    /// have run on it.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create every table the control plane uses. Idempotent.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS bots (
                id                TEXT    PRIMARY KEY,
                name              TEXT    NOT NULL,
                client_id         TEXT    NOT NULL,
                token_sealed      TEXT    NOT NULL,
                guild_id          TEXT    NOT NULL,
                admin_role_id     TEXT,
                trial_role_id     TEXT,
                features          TEXT    NOT NULL DEFAULT '[]',
                active            INTEGER NOT NULL DEFAULT 1,
                last_heartbeat_at INTEGER,
                reconcile_at      INTEGER NOT NULL,
                created_at        INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS point_configs (
                bot_id             TEXT    PRIMARY KEY,
                points_per_message INTEGER NOT NULL,
                cooldown_secs      INTEGER NOT NULL,
                channels           TEXT    NOT NULL DEFAULT '[]'
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS redeem_items (
                id            TEXT    PRIMARY KEY,
                bot_id        TEXT    NOT NULL,
                role_id       TEXT    NOT NULL,
                role_name     TEXT    NOT NULL,
                cost          INTEGER NOT NULL,
                duration_days INTEGER NOT NULL,
                is_active     INTEGER NOT NULL DEFAULT 1
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS mirror_paths (
                id            TEXT    PRIMARY KEY,
                user_id       TEXT    NOT NULL,
                platform      TEXT    NOT NULL,
                source_sealed TEXT    NOT NULL,
                blacklist     TEXT    NOT NULL DEFAULT '[]',
                active        INTEGER NOT NULL DEFAULT 0,
                created_at    INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_mirror_paths_user ON mirror_paths(user_id)")
            .execute(pool)
            .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS mirror_signals (
                user_id      TEXT    PRIMARY KEY,
                reconcile_at INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS subscriptions (
                user_id    TEXT    PRIMARY KEY,
                tier       TEXT    NOT NULL DEFAULT 'free',
                expires_at INTEGER,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS payments (
                order_id   TEXT    PRIMARY KEY,
                user_id    TEXT    NOT NULL,
                amount     INTEGER NOT NULL,
                plan       TEXT    NOT NULL,
                status     TEXT    NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_payments_user ON payments(user_id)")
            .execute(pool)
            .await?;

        Ok(())
    }
}

// ── Shared statement helpers ────────────────────────────────────────────────

/// Advances a bot's reconcile signal. `MAX(now, reconcile_at + 1)` keeps the
/// value strictly increasing even when the clock stalls or rewinds.
async fn bump_bot_signal(conn: &mut SqliteConnection, bot_id: &str, now_ms: i64) -> Result<u64> {
    let result = sqlx::query("UPDATE bots SET reconcile_at = MAX(?, reconcile_at + 1) WHERE id = ?")
        .bind(now_ms)
        .bind(bot_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Advances the user-scoped mirror signal, creating the row on first touch.
async fn bump_mirror_signal(conn: &mut SqliteConnection, user_id: &str, now_ms: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO mirror_signals (user_id, reconcile_at) VALUES (?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
           reconcile_at = MAX(excluded.reconcile_at, reconcile_at + 1)",
    )
    .bind(user_id)
    .bind(now_ms)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn load_subscription(conn: &mut SqliteConnection, user_id: &str) -> Result<Subscription> {
    let row =
        sqlx::query_as::<_, SubscriptionRow>("SELECT * FROM subscriptions WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
    match row {
        Some(row) => row.try_into(),
        None => Ok(Subscription::free(user_id)),
    }
}

async fn load_user_mirrors(conn: &mut SqliteConnection, user_id: &str) -> Result<Vec<MirrorPath>> {
    let rows = sqlx::query_as::<_, MirrorRow>(
        "SELECT * FROM mirror_paths WHERE user_id = ? ORDER BY created_at, id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(TryInto::try_into).collect()
}

/// Recomputes the user's active set under `tier` and applies the flips.
/// Bumps the mirror signal only when something actually changed.
async fn apply_reconcile(
    conn: &mut SqliteConnection,
    user_id: &str,
    tier: PlanTier,
    now_ms: i64,
) -> Result<ActivationPlan> {
    let mirrors = load_user_mirrors(conn, user_id).await?;
    let candidates: Vec<MirrorCandidate> = mirrors
        .into_iter()
        .map(|m| MirrorCandidate {
            id: m.id,
            platform: m.platform,
            active: m.active,
            created_at: m.created_at,
        })
        .collect();

    let plan = reconcile_activation(&candidates, tier);
    for id in &plan.activate {
        sqlx::query("UPDATE mirror_paths SET active = 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    for id in &plan.deactivate {
        sqlx::query("UPDATE mirror_paths SET active = 0 WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    if !plan.is_noop() {
        bump_mirror_signal(conn, user_id, now_ms).await?;
    }
    Ok(plan)
}

async fn upsert_subscription_row(
    conn: &mut SqliteConnection,
    user_id: &str,
    tier: PlanTier,
    expires_at: Option<i64>,
    now_ms: i64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO subscriptions (user_id, tier, expires_at, updated_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
           tier       = excluded.tier,
           expires_at = excluded.expires_at,
           updated_at = excluded.updated_at",
    )
    .bind(user_id)
    .bind(tier.as_str())
    .bind(expires_at)
    .bind(now_ms)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_payment_row(conn: &mut SqliteConnection, record: &PaymentRecord) -> Result<()> {
    sqlx::query(
        "INSERT INTO payments (order_id, user_id, amount, plan, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(order_id) DO UPDATE SET
           status     = excluded.status,
           updated_at = excluded.updated_at",
    )
    .bind(&record.order_id)
    .bind(&record.user_id)
    .bind(record.amount)
    .bind(record.plan.as_str())
    .bind(record.status.as_str())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ── ControlStore impl ───────────────────────────────────────────────────────

#[async_trait]
impl ControlStore for SqliteControlStore {
    async fn create_bot(&self, new: NewBot, now_ms: i64) -> Result<BotIdentity> {
        new.validate().map_err(StoreError::Validation)?;
        let bot = BotIdentity {
            id: new_id(),
            name: new.name,
            client_id: new.client_id,
            token_sealed: new.token_sealed,
            guild_id: new.guild_id,
            admin_role_id: new.admin_role_id,
            trial_role_id: new.trial_role_id,
            features: new.features,
            active: true,
            last_heartbeat_at: None,
            reconcile_at: now_ms,
            created_at: now_ms,
        };
        sqlx::query(
            "INSERT INTO bots (id, name, client_id, token_sealed, guild_id, admin_role_id,
                               trial_role_id, features, active, last_heartbeat_at,
                               reconcile_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&bot.id)
        .bind(&bot.name)
        .bind(&bot.client_id)
        .bind(&bot.token_sealed)
        .bind(&bot.guild_id)
        .bind(&bot.admin_role_id)
        .bind(&bot.trial_role_id)
        .bind(serde_json::to_string(&bot.features)?)
        .bind(bot.active)
        .bind(bot.last_heartbeat_at)
        .bind(bot.reconcile_at)
        .bind(bot.created_at)
        .execute(&self.pool)
        .await?;
        info!(bot_id = %bot.id, name = %bot.name, "bot registered");
        Ok(bot)
    }

    async fn get_bot(&self, id: &str) -> Result<BotIdentity> {
        sqlx::query_as::<_, BotRow>("SELECT * FROM bots WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?
            .try_into()
    }

    async fn list_bots(&self) -> Result<Vec<BotIdentity>> {
        let rows = sqlx::query_as::<_, BotRow>("SELECT * FROM bots ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_bot(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM point_configs WHERE bot_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM redeem_items WHERE bot_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM bots WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().await?;
        info!(bot_id = %id, "bot deleted");
        Ok(())
    }

    async fn set_bot_features(
        &self,
        id: &str,
        features: CapabilitySet,
        now_ms: i64,
    ) -> Result<BotIdentity> {
        let result = sqlx::query(
            "UPDATE bots SET features = ?, reconcile_at = MAX(?, reconcile_at + 1) WHERE id = ?",
        )
        .bind(serde_json::to_string(&features)?)
        .bind(now_ms)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_bot(id).await
    }

    async fn set_bot_token(&self, id: &str, token_sealed: &str, now_ms: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE bots SET token_sealed = ?, reconcile_at = MAX(?, reconcile_at + 1)
             WHERE id = ?",
        )
        .bind(token_sealed)
        .bind(now_ms)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        info!(bot_id = %id, "bot token rotated");
        Ok(())
    }

    async fn set_bot_active(&self, id: &str, active: bool, now_ms: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE bots SET active = ?, reconcile_at = MAX(?, reconcile_at + 1) WHERE id = ?",
        )
        .bind(active)
        .bind(now_ms)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn record_heartbeat(&self, bot_id: &str, now_ms: i64) -> Result<()> {
        let result = sqlx::query("UPDATE bots SET last_heartbeat_at = ? WHERE id = ?")
            .bind(now_ms)
            .bind(bot_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn upsert_point_config(
        &self,
        bot_id: &str,
        config: &PointConfig,
        now_ms: i64,
    ) -> Result<()> {
        config.validate().map_err(StoreError::Validation)?;
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO point_configs (bot_id, points_per_message, cooldown_secs, channels)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(bot_id) DO UPDATE SET
               points_per_message = excluded.points_per_message,
               cooldown_secs      = excluded.cooldown_secs,
               channels           = excluded.channels",
        )
        .bind(bot_id)
        .bind(config.points_per_message as i64)
        .bind(config.cooldown_secs as i64)
        .bind(serde_json::to_string(&config.channels)?)
        .execute(&mut *tx)
        .await?;
        if bump_bot_signal(&mut tx, bot_id, now_ms).await? == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_point_config(&self, bot_id: &str) -> Result<Option<PointConfig>> {
        let row = sqlx::query_as::<_, PointRow>(
            "SELECT points_per_message, cooldown_secs, channels FROM point_configs
             WHERE bot_id = ?",
        )
        .bind(bot_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn create_redeem_item(&self, new: NewRedeemItem, now_ms: i64) -> Result<RedeemItem> {
        new.validate().map_err(StoreError::Validation)?;
        let item = RedeemItem {
            id: new_id(),
            bot_id: new.bot_id,
            role_id: new.role_id,
            role_name: new.role_name,
            cost: new.cost,
            duration_days: new.duration_days,
            is_active: true,
        };
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO redeem_items (id, bot_id, role_id, role_name, cost, duration_days,
                                       is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.bot_id)
        .bind(&item.role_id)
        .bind(&item.role_name)
        .bind(item.cost)
        .bind(item.duration_days)
        .bind(item.is_active)
        .execute(&mut *tx)
        .await?;
        if bump_bot_signal(&mut tx, &item.bot_id, now_ms).await? == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().await?;
        Ok(item)
    }

    async fn list_redeem_items(&self, bot_id: &str) -> Result<Vec<RedeemItem>> {
        let rows = sqlx::query_as::<_, RedeemRow>(
            "SELECT * FROM redeem_items WHERE bot_id = ? ORDER BY cost, id",
        )
        .bind(bot_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_redeem_item(&self, bot_id: &str, redeem_id: &str, now_ms: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM redeem_items WHERE id = ? AND bot_id = ?")
            .bind(redeem_id)
            .bind(bot_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        bump_bot_signal(&mut tx, bot_id, now_ms).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn create_mirror_path(&self, new: NewMirrorPath, now_ms: i64) -> Result<MirrorPath> {
        new.validate().map_err(StoreError::Validation)?;
        let path = MirrorPath {
            id: new_id(),
            user_id: new.user_id,
            platform: new.platform,
            source_sealed: new.source_sealed,
            blacklist: Vec::new(),
            active: false,
            created_at: now_ms,
        };
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO mirror_paths (id, user_id, platform, source_sealed, blacklist,
                                       active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&path.id)
        .bind(&path.user_id)
        .bind(path.platform.as_str())
        .bind(&path.source_sealed)
        .bind(serde_json::to_string(&path.blacklist)?)
        .bind(path.active)
        .bind(path.created_at)
        .execute(&mut *tx)
        .await?;
        bump_mirror_signal(&mut tx, &path.user_id, now_ms).await?;
        tx.commit().await?;
        info!(path_id = %path.id, user_id = %path.user_id, platform = %path.platform,
              "mirror path created");
        Ok(path)
    }

    async fn get_mirror_path(&self, id: &str) -> Result<MirrorPath> {
        sqlx::query_as::<_, MirrorRow>("SELECT * FROM mirror_paths WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?
            .try_into()
    }

    async fn list_mirror_paths(&self, user_id: &str) -> Result<Vec<MirrorPath>> {
        let mut conn = self.pool.acquire().await?;
        load_user_mirrors(&mut conn, user_id).await
    }

    async fn delete_mirror_path(&self, id: &str, now_ms: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let row: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM mirror_paths WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((user_id,)) = row else {
            return Err(StoreError::NotFound);
        };
        sqlx::query("DELETE FROM mirror_paths WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        bump_mirror_signal(&mut tx, &user_id, now_ms).await?;
        tx.commit().await?;
        info!(path_id = %id, user_id = %user_id, "mirror path deleted");
        Ok(())
    }

    async fn get_mirror_signal(&self, user_id: &str) -> Result<i64> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT reconcile_at FROM mirror_signals WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(v,)| v).unwrap_or(0))
    }

    async fn activate_mirror_path(&self, id: &str, now_ms: i64) -> Result<MirrorPath> {
        let mut tx = self.pool.begin().await?;
        let path: MirrorPath = sqlx::query_as::<_, MirrorRow>(
            "SELECT * FROM mirror_paths WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?
        .try_into()?;

        if path.active {
            return Ok(path);
        }

        let subscription = load_subscription(&mut tx, &path.user_id).await?;
        let quota = quota_for(subscription.effective_tier(now_ms));
        if !quota.allows(path.platform) {
            return Err(EntitlementError::PlatformNotAllowed {
                platform: path.platform,
            }
            .into());
        }
        let (active_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM mirror_paths WHERE user_id = ? AND active = 1",
        )
        .bind(&path.user_id)
        .fetch_one(&mut *tx)
        .await?;
        if active_count as usize >= quota.max_active_mirrors {
            return Err(EntitlementError::QuotaExceeded {
                limit: quota.max_active_mirrors,
            }
            .into());
        }

        sqlx::query("UPDATE mirror_paths SET active = 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        bump_mirror_signal(&mut tx, &path.user_id, now_ms).await?;
        tx.commit().await?;
        info!(path_id = %id, user_id = %path.user_id, "mirror path activated");
        Ok(MirrorPath {
            active: true,
            ..path
        })
    }

    async fn deactivate_mirror_path(&self, id: &str, now_ms: i64) -> Result<MirrorPath> {
        let mut tx = self.pool.begin().await?;
        let path: MirrorPath = sqlx::query_as::<_, MirrorRow>(
            "SELECT * FROM mirror_paths WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?
        .try_into()?;

        if !path.active {
            return Ok(path);
        }

        sqlx::query("UPDATE mirror_paths SET active = 0 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        bump_mirror_signal(&mut tx, &path.user_id, now_ms).await?;
        tx.commit().await?;
        Ok(MirrorPath {
            active: false,
            ..path
        })
    }

    async fn add_to_blacklist(&self, path_id: &str, sender_id: &str, now_ms: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT user_id, blacklist FROM mirror_paths WHERE id = ?")
                .bind(path_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((user_id, blacklist_json)) = row else {
            return Err(StoreError::NotFound);
        };

        let mut blacklist: Vec<String> = serde_json::from_str(&blacklist_json)?;
        if blacklist.iter().any(|s| s == sender_id) {
            return Ok(false);
        }
        blacklist.push(sender_id.to_string());

        sqlx::query("UPDATE mirror_paths SET blacklist = ? WHERE id = ?")
            .bind(serde_json::to_string(&blacklist)?)
            .bind(path_id)
            .execute(&mut *tx)
            .await?;
        bump_mirror_signal(&mut tx, &user_id, now_ms).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn reconcile_user_mirrors(&self, user_id: &str, now_ms: i64) -> Result<ActivationPlan> {
        let mut tx = self.pool.begin().await?;
        let subscription = load_subscription(&mut tx, user_id).await?;
        let plan =
            apply_reconcile(&mut tx, user_id, subscription.effective_tier(now_ms), now_ms).await?;
        tx.commit().await?;
        if !plan.is_noop() {
            info!(user_id = %user_id, activated = plan.activate.len(),
                  deactivated = plan.deactivate.len(), "mirror activation reconciled");
        }
        Ok(plan)
    }

    async fn get_subscription(&self, user_id: &str) -> Result<Subscription> {
        let mut conn = self.pool.acquire().await?;
        load_subscription(&mut conn, user_id).await
    }

    async fn set_subscription(
        &self,
        user_id: &str,
        tier: PlanTier,
        expires_at: Option<i64>,
        now_ms: i64,
    ) -> Result<ActivationPlan> {
        let mut tx = self.pool.begin().await?;
        upsert_subscription_row(&mut tx, user_id, tier, expires_at, now_ms).await?;
        let effective = Subscription {
            user_id: user_id.to_string(),
            tier,
            expires_at,
        }
        .effective_tier(now_ms);
        let plan = apply_reconcile(&mut tx, user_id, effective, now_ms).await?;
        tx.commit().await?;
        info!(user_id = %user_id, tier = %tier, "subscription updated");
        Ok(plan)
    }

    async fn get_payment(&self, order_id: &str) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query_as::<_, PaymentRow>("SELECT * FROM payments WHERE order_id = ?")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn record_payment(&self, record: &PaymentRecord) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_payment_row(&mut conn, record).await
    }

    async fn apply_payment_success(
        &self,
        record: &PaymentRecord,
        expires_at: i64,
        now_ms: i64,
    ) -> Result<ActivationPlan> {
        let mut tx = self.pool.begin().await?;
        upsert_payment_row(&mut tx, record).await?;
        upsert_subscription_row(&mut tx, &record.user_id, record.plan, Some(expires_at), now_ms)
            .await?;
        let effective = Subscription {
            user_id: record.user_id.clone(),
            tier: record.plan,
            expires_at: Some(expires_at),
        }
        .effective_tier(now_ms);
        let plan = apply_reconcile(&mut tx, &record.user_id, effective, now_ms).await?;
        tx.commit().await?;
        info!(order_id = %record.order_id, user_id = %record.user_id, plan = %record.plan,
              "payment applied");
        Ok(plan)
    }

    async fn migrate_plaintext_secrets(&self, vault: &Vault) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        let bots: Vec<(String, String)> = sqlx::query_as("SELECT id, token_sealed FROM bots")
            .fetch_all(&self.pool)
            .await?;
        for (id, token) in bots {
            if looks_sealed(&token) {
                continue;
            }
            let sealed = vault.seal(&token)?;
            sqlx::query("UPDATE bots SET token_sealed = ? WHERE id = ?")
                .bind(&sealed)
                .bind(&id)
                .execute(&self.pool)
                .await?;
            report.bots_resealed += 1;
        }

        let mirrors: Vec<(String, String)> =
            sqlx::query_as("SELECT id, source_sealed FROM mirror_paths")
                .fetch_all(&self.pool)
                .await?;
        for (id, source) in mirrors {
            if looks_sealed(&source) {
                continue;
            }
            let sealed = vault.seal(&source)?;
            sqlx::query("UPDATE mirror_paths SET source_sealed = ? WHERE id = ?")
                .bind(&sealed)
                .bind(&id)
                .execute(&self.pool)
                .await?;
            report.mirrors_resealed += 1;
        }

        if report.total() > 0 {
            info!(bots = report.bots_resealed, mirrors = report.mirrors_resealed,
                  "legacy plaintext credentials sealed");
        }
        Ok(report)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mirrorplane_entitlement::Capability};

    const T0: i64 = 1_700_000_000_000;

    async fn make_store() -> SqliteControlStore {
        SqliteControlStore::new("sqlite::memory:").await.unwrap()
    }

    fn sample_bot(name: &str) -> NewBot {
        NewBot {
            name: name.into(),
            client_id: "client-1".into(),
            token_sealed: "aa11".repeat(6) + ":" + &"bb22".repeat(8) + ":" + "cafe",
            guild_id: "guild-1".into(),
            admin_role_id: Some("role-admin".into()),
            trial_role_id: None,
            features: [Capability::Base].into_iter().collect(),
        }
    }

    fn sample_mirror(user_id: &str, platform: Platform) -> NewMirrorPath {
        NewMirrorPath {
            user_id: user_id.into(),
            platform,
            source_sealed: "sealed-source".into(),
        }
    }

    // ── Bots ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn bot_create_get_list() {
        let store = make_store().await;
        let bot = store.create_bot(sample_bot("mirror-1"), T0).await.unwrap();
        assert!(bot.active);
        assert_eq!(bot.reconcile_at, T0);
        assert_eq!(bot.last_heartbeat_at, None);

        let got = store.get_bot(&bot.id).await.unwrap();
        assert_eq!(got, bot);

        store.create_bot(sample_bot("mirror-2"), T0 + 1).await.unwrap();
        let all = store.list_bots().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "mirror-1");
    }

    #[tokio::test]
    async fn bot_create_rejects_empty_name() {
        let store = make_store().await;
        let mut new = sample_bot("x");
        new.name = "  ".into();
        assert!(matches!(
            store.create_bot(new, T0).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn get_missing_bot_is_not_found() {
        let store = make_store().await;
        assert!(matches!(store.get_bot("nope").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn feature_update_advances_signal_even_with_frozen_clock() {
        let store = make_store().await;
        let bot = store.create_bot(sample_bot("b"), T0).await.unwrap();

        let caps: CapabilitySet = [Capability::Base, Capability::Elite].into_iter().collect();
        let after_first = store.set_bot_features(&bot.id, caps.clone(), T0).await.unwrap();
        assert_eq!(after_first.reconcile_at, T0 + 1);

        let after_second = store.set_bot_features(&bot.id, caps, T0).await.unwrap();
        assert_eq!(after_second.reconcile_at, T0 + 2);
    }

    #[tokio::test]
    async fn token_rotation_updates_blob_and_signal() {
        let store = make_store().await;
        let bot = store.create_bot(sample_bot("b"), T0).await.unwrap();
        store.set_bot_token(&bot.id, "new-sealed-blob", T0 + 5).await.unwrap();

        let got = store.get_bot(&bot.id).await.unwrap();
        assert_eq!(got.token_sealed, "new-sealed-blob");
        assert_eq!(got.reconcile_at, T0 + 5);
    }

    #[tokio::test]
    async fn heartbeat_does_not_touch_signal() {
        let store = make_store().await;
        let bot = store.create_bot(sample_bot("b"), T0).await.unwrap();
        store.record_heartbeat(&bot.id, T0 + 30_000).await.unwrap();

        let got = store.get_bot(&bot.id).await.unwrap();
        assert_eq!(got.last_heartbeat_at, Some(T0 + 30_000));
        assert_eq!(got.reconcile_at, T0);
    }

    // ── Point configs ───────────────────────────────────────────────────

    #[tokio::test]
    async fn point_config_upsert_replaces_not_merges() {
        let store = make_store().await;
        let bot = store.create_bot(sample_bot("b"), T0).await.unwrap();

        let first = PointConfig {
            points_per_message: 5,
            cooldown_secs: 60,
            channels: vec!["general".into(), "chat".into()],
        };
        store.upsert_point_config(&bot.id, &first, T0 + 1).await.unwrap();
        assert_eq!(store.get_point_config(&bot.id).await.unwrap(), Some(first));

        let second = PointConfig {
            points_per_message: 10,
            cooldown_secs: 0,
            channels: vec!["vip".into()],
        };
        store.upsert_point_config(&bot.id, &second, T0 + 2).await.unwrap();
        let got = store.get_point_config(&bot.id).await.unwrap().unwrap();
        assert_eq!(got.channels, vec!["vip".to_string()]);
        assert_eq!(got.points_per_message, 10);

        let bot_after = store.get_bot(&bot.id).await.unwrap();
        assert_eq!(bot_after.reconcile_at, T0 + 2);
    }

    #[tokio::test]
    async fn point_config_out_of_bounds_rejected() {
        let store = make_store().await;
        let bot = store.create_bot(sample_bot("b"), T0).await.unwrap();
        let bad = PointConfig {
            points_per_message: 0,
            cooldown_secs: 10,
            channels: vec![],
        };
        assert!(matches!(
            store.upsert_point_config(&bot.id, &bad, T0).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn point_config_for_missing_bot_is_not_found() {
        let store = make_store().await;
        let config = PointConfig {
            points_per_message: 1,
            cooldown_secs: 0,
            channels: vec![],
        };
        assert!(matches!(
            store.upsert_point_config("ghost", &config, T0).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.get_point_config("ghost").await.unwrap(), None);
    }

    // ── Redeem items ────────────────────────────────────────────────────

    #[tokio::test]
    async fn redeem_lifecycle_bumps_bot_signal() {
        let store = make_store().await;
        let bot = store.create_bot(sample_bot("b"), T0).await.unwrap();

        let item = store
            .create_redeem_item(
                NewRedeemItem {
                    bot_id: bot.id.clone(),
                    role_id: "r1".into(),
                    role_name: "VIP".into(),
                    cost: 500,
                    duration_days: 30,
                },
                T0 + 1,
            )
            .await
            .unwrap();
        assert!(item.is_active);

        store
            .create_redeem_item(
                NewRedeemItem {
                    bot_id: bot.id.clone(),
                    role_id: "r2".into(),
                    role_name: "Bronze".into(),
                    cost: 100,
                    duration_days: 7,
                },
                T0 + 2,
            )
            .await
            .unwrap();

        let items = store.list_redeem_items(&bot.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].role_name, "Bronze"); // cheapest first

        store.delete_redeem_item(&bot.id, &item.id, T0 + 3).await.unwrap();
        assert_eq!(store.list_redeem_items(&bot.id).await.unwrap().len(), 1);
        assert_eq!(store.get_bot(&bot.id).await.unwrap().reconcile_at, T0 + 3);

        assert!(matches!(
            store.delete_redeem_item(&bot.id, &item.id, T0 + 4).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn bot_delete_cascades_to_children() {
        let store = make_store().await;
        let bot = store.create_bot(sample_bot("b"), T0).await.unwrap();
        let config = PointConfig {
            points_per_message: 2,
            cooldown_secs: 30,
            channels: vec![],
        };
        store.upsert_point_config(&bot.id, &config, T0).await.unwrap();
        store
            .create_redeem_item(
                NewRedeemItem {
                    bot_id: bot.id.clone(),
                    role_id: "r".into(),
                    role_name: "n".into(),
                    cost: 1,
                    duration_days: 1,
                },
                T0,
            )
            .await
            .unwrap();

        store.delete_bot(&bot.id).await.unwrap();
        assert!(matches!(store.get_bot(&bot.id).await, Err(StoreError::NotFound)));
        assert_eq!(store.get_point_config(&bot.id).await.unwrap(), None);
        assert!(store.list_redeem_items(&bot.id).await.unwrap().is_empty());

        assert!(matches!(store.delete_bot(&bot.id).await, Err(StoreError::NotFound)));
    }

    // ── Mirror paths ────────────────────────────────────────────────────

    #[tokio::test]
    async fn mirror_paths_create_inactive_and_signal_advances() {
        let store = make_store().await;
        assert_eq!(store.get_mirror_signal("u1").await.unwrap(), 0);

        let path = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0)
            .await
            .unwrap();
        assert!(!path.active);
        assert!(path.blacklist.is_empty());
        assert_eq!(store.get_mirror_signal("u1").await.unwrap(), T0);

        let listed = store.list_mirror_paths("u1").await.unwrap();
        assert_eq!(listed, vec![path]);
    }

    #[tokio::test]
    async fn activation_enforces_free_quota() {
        let store = make_store().await;
        let first = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0)
            .await
            .unwrap();
        let second = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0 + 1)
            .await
            .unwrap();

        let activated = store.activate_mirror_path(&first.id, T0 + 2).await.unwrap();
        assert!(activated.active);

        let err = store.activate_mirror_path(&second.id, T0 + 3).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Entitlement(EntitlementError::QuotaExceeded { limit: 1 })
        ));
    }

    #[tokio::test]
    async fn activation_rejects_disallowed_platform() {
        let store = make_store().await;
        let path = store
            .create_mirror_path(sample_mirror("u1", Platform::Telegram), T0)
            .await
            .unwrap();
        let err = store.activate_mirror_path(&path.id, T0 + 1).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Entitlement(EntitlementError::PlatformNotAllowed {
                platform: Platform::Telegram
            })
        ));
    }

    #[tokio::test]
    async fn re_activation_is_a_noop() {
        let store = make_store().await;
        let path = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0)
            .await
            .unwrap();
        store.activate_mirror_path(&path.id, T0 + 1).await.unwrap();
        let signal_after_first = store.get_mirror_signal("u1").await.unwrap();

        let again = store.activate_mirror_path(&path.id, T0 + 2).await.unwrap();
        assert!(again.active);
        assert_eq!(store.get_mirror_signal("u1").await.unwrap(), signal_after_first);
    }

    #[tokio::test]
    async fn paid_tier_lets_more_paths_activate() {
        let store = make_store().await;
        store.set_subscription("u1", PlanTier::Starter, None, T0).await.unwrap();
        let a = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0)
            .await
            .unwrap();
        let b = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0 + 1)
            .await
            .unwrap();
        store.activate_mirror_path(&a.id, T0 + 2).await.unwrap();
        store.activate_mirror_path(&b.id, T0 + 3).await.unwrap();

        let active: Vec<bool> = store
            .list_mirror_paths("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.active)
            .collect();
        assert_eq!(active, vec![true, true]);
    }

    #[tokio::test]
    async fn expired_subscription_counts_as_free_at_activation() {
        let store = make_store().await;
        store
            .set_subscription("u1", PlanTier::Pro, Some(T0 - 1), T0 - 100)
            .await
            .unwrap();
        let path = store
            .create_mirror_path(sample_mirror("u1", Platform::Telegram), T0)
            .await
            .unwrap();
        let err = store.activate_mirror_path(&path.id, T0).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Entitlement(EntitlementError::PlatformNotAllowed { .. })
        ));
    }

    #[tokio::test]
    async fn deactivate_then_delete_moves_signal() {
        let store = make_store().await;
        let path = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0)
            .await
            .unwrap();
        store.activate_mirror_path(&path.id, T0).await.unwrap();
        let s1 = store.get_mirror_signal("u1").await.unwrap();

        let deactivated = store.deactivate_mirror_path(&path.id, T0).await.unwrap();
        assert!(!deactivated.active);
        let s2 = store.get_mirror_signal("u1").await.unwrap();
        assert!(s2 > s1);

        store.delete_mirror_path(&path.id, T0).await.unwrap();
        let s3 = store.get_mirror_signal("u1").await.unwrap();
        assert!(s3 > s2);
        assert!(matches!(
            store.get_mirror_path(&path.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn blacklist_union_is_idempotent() {
        let store = make_store().await;
        let path = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0)
            .await
            .unwrap();

        assert!(store.add_to_blacklist(&path.id, "spammer", T0 + 1).await.unwrap());
        let signal_after_add = store.get_mirror_signal("u1").await.unwrap();

        assert!(!store.add_to_blacklist(&path.id, "spammer", T0 + 2).await.unwrap());
        let got = store.get_mirror_path(&path.id).await.unwrap();
        assert_eq!(got.blacklist, vec!["spammer".to_string()]);
        assert_eq!(store.get_mirror_signal("u1").await.unwrap(), signal_after_add);
    }

    // ── Subscriptions & reconcile ───────────────────────────────────────

    #[tokio::test]
    async fn subscription_defaults_to_free() {
        let store = make_store().await;
        let sub = store.get_subscription("nobody").await.unwrap();
        assert_eq!(sub.tier, PlanTier::Free);
        assert_eq!(sub.expires_at, None);
    }

    #[tokio::test]
    async fn plan_change_reconciles_in_creation_order() {
        let store = make_store().await;
        let mut ids = Vec::new();
        for i in 0..3 {
            let p = store
                .create_mirror_path(sample_mirror("u1", Platform::Discord), T0 + i)
                .await
                .unwrap();
            ids.push(p.id);
        }

        let plan = store
            .set_subscription("u1", PlanTier::Starter, None, T0 + 10)
            .await
            .unwrap();
        assert_eq!(plan.activate, ids[..2].to_vec());

        let plan = store
            .set_subscription("u1", PlanTier::Free, None, T0 + 20)
            .await
            .unwrap();
        assert_eq!(plan.deactivate, vec![ids[1].clone()]);

        let paths = store.list_mirror_paths("u1").await.unwrap();
        let active: Vec<bool> = paths.iter().map(|p| p.active).collect();
        assert_eq!(active, vec![true, false, false]);
    }

    #[tokio::test]
    async fn audit_sweep_heals_drift() {
        let store = make_store().await;
        for i in 0..2 {
            store
                .create_mirror_path(sample_mirror("u1", Platform::Discord), T0 + i)
                .await
                .unwrap();
        }
        store.set_subscription("u1", PlanTier::Starter, None, T0 + 5).await.unwrap();

        // Second sweep with nothing changed must be a no-op.
        let plan = store.reconcile_user_mirrors("u1", T0 + 6).await.unwrap();
        assert!(plan.is_noop());
    }

    // ── Payments ────────────────────────────────────────────────────────

    fn payment(order_id: &str, status: PaymentStatus) -> PaymentRecord {
        PaymentRecord {
            order_id: order_id.into(),
            user_id: "u1".into(),
            amount: 50_000,
            plan: PlanTier::Starter,
            status,
            created_at: T0,
            updated_at: T0,
        }
    }

    #[tokio::test]
    async fn payment_record_round_trip() {
        let store = make_store().await;
        assert!(store.get_payment("DISBOT-u1-1").await.unwrap().is_none());

        store.record_payment(&payment("DISBOT-u1-1", PaymentStatus::Pending)).await.unwrap();
        let got = store.get_payment("DISBOT-u1-1").await.unwrap().unwrap();
        assert_eq!(got.status, PaymentStatus::Pending);

        let mut update = payment("DISBOT-u1-1", PaymentStatus::Failed);
        update.updated_at = T0 + 10;
        store.record_payment(&update).await.unwrap();
        let got = store.get_payment("DISBOT-u1-1").await.unwrap().unwrap();
        assert_eq!(got.status, PaymentStatus::Failed);
        assert_eq!(got.created_at, T0); // preserved across upsert
        assert_eq!(got.updated_at, T0 + 10);
    }

    #[tokio::test]
    async fn payment_success_applies_everything_at_once() {
        let store = make_store().await;
        let a = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0)
            .await
            .unwrap();
        let b = store
            .create_mirror_path(sample_mirror("u1", Platform::Discord), T0 + 1)
            .await
            .unwrap();

        let record = payment("DISBOT-u1-2", PaymentStatus::Success);
        let expires = T0 + 30 * 86_400_000;
        let plan = store.apply_payment_success(&record, expires, T0 + 5).await.unwrap();
        assert_eq!(plan.activate, vec![a.id.clone(), b.id.clone()]);

        let sub = store.get_subscription("u1").await.unwrap();
        assert_eq!(sub.tier, PlanTier::Starter);
        assert_eq!(sub.expires_at, Some(expires));

        let got = store.get_payment("DISBOT-u1-2").await.unwrap().unwrap();
        assert_eq!(got.status, PaymentStatus::Success);
    }

    // ── Maintenance ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn migration_seals_only_plaintext_rows() {
        let store = make_store().await;
        let vault = Vault::new("migration-test-secret");

        let mut legacy = sample_bot("legacy");
        legacy.token_sealed = "legacy-plain-token".into();
        let legacy_bot = store.create_bot(legacy, T0).await.unwrap();

        let mut sealed = sample_bot("sealed");
        sealed.token_sealed = vault.seal("already-sealed").unwrap();
        let sealed_bot = store.create_bot(sealed, T0).await.unwrap();

        let mut mirror = sample_mirror("u1", Platform::Discord);
        mirror.source_sealed = "legacy-mirror-cred".into();
        let path = store.create_mirror_path(mirror, T0).await.unwrap();

        let report = store.migrate_plaintext_secrets(&vault).await.unwrap();
        assert_eq!(report.bots_resealed, 1);
        assert_eq!(report.mirrors_resealed, 1);

        let got = store.get_bot(&legacy_bot.id).await.unwrap();
        assert!(looks_sealed(&got.token_sealed));
        assert_eq!(vault.open(&got.token_sealed).unwrap(), "legacy-plain-token");

        let untouched = store.get_bot(&sealed_bot.id).await.unwrap();
        assert_eq!(vault.open(&untouched.token_sealed).unwrap(), "already-sealed");

        let got_path = store.get_mirror_path(&path.id).await.unwrap();
        assert_eq!(vault.open(&got_path.source_sealed).unwrap(), "legacy-mirror-cred");

        // Second sweep finds nothing.
        let again = store.migrate_plaintext_secrets(&vault).await.unwrap();
        assert_eq!(again.total(), 0);
    }
}

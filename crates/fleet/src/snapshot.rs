//! Snapshot loaders for the worker pull contract.
//!
//! A snapshot is everything one worker needs to (re)configure itself in a
//! single call, credentials already opened. The signal value is read before
//! the rows it covers, so a write racing the load costs the worker one extra
//! reload instead of a missed one.

use std::fmt;

use tracing::debug;

use {
    mirrorplane_common::redact::preview,
    mirrorplane_store::{BotIdentity, ControlStore, MirrorPath, PointConfig, RedeemItem},
    mirrorplane_vault::Vault,
};

use crate::error::FleetError;

/// Full configuration for one guild worker.
pub struct BotSnapshot {
    pub bot: BotIdentity,
    /// Opened platform token.
    pub token: String,
    pub point_config: Option<PointConfig>,
    pub redeem_items: Vec<RedeemItem>,
}

impl BotSnapshot {
    /// Signal value this snapshot was taken at.
    pub fn reconcile_at(&self) -> i64 {
        self.bot.reconcile_at
    }
}

impl fmt::Debug for BotSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotSnapshot")
            .field("bot", &self.bot.id)
            .field("token", &preview(&self.token))
            .field("point_config", &self.point_config)
            .field("redeem_items", &self.redeem_items.len())
            .finish()
    }
}

/// One active mirror path with its source credential opened.
pub struct MirrorSource {
    pub path: MirrorPath,
    pub credential: String,
}

impl fmt::Debug for MirrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorSource")
            .field("path", &self.path.id)
            .field("credential", &preview(&self.credential))
            .finish()
    }
}

/// Full configuration for one user's mirror worker.
#[derive(Debug)]
pub struct MirrorSnapshot {
    /// The user's mirror signal at load time.
    pub reconcile_at: i64,
    /// Active paths only; a path missing from here is one the worker stops.
    pub paths: Vec<MirrorSource>,
}

/// Load everything a guild worker needs: identity, opened token, point
/// config, and redeem items.
pub async fn load_bot_snapshot(
    store: &dyn ControlStore,
    vault: &Vault,
    bot_id: &str,
) -> Result<BotSnapshot, FleetError> {
    let bot = store.get_bot(bot_id).await?;
    let token = vault.open(&bot.token_sealed)?;
    let point_config = store.get_point_config(bot_id).await?;
    let redeem_items = store.list_redeem_items(bot_id).await?;
    debug!(bot_id = %bot.id, reconcile_at = bot.reconcile_at, "bot snapshot loaded");
    Ok(BotSnapshot {
        bot,
        token,
        point_config,
        redeem_items,
    })
}

/// Load the active mirror paths for one user with their credentials opened.
pub async fn load_mirror_snapshot(
    store: &dyn ControlStore,
    vault: &Vault,
    user_id: &str,
) -> Result<MirrorSnapshot, FleetError> {
    let reconcile_at = store.get_mirror_signal(user_id).await?;
    let mut paths = Vec::new();
    for path in store.list_mirror_paths(user_id).await? {
        if !path.active {
            continue;
        }
        let credential = vault.open(&path.source_sealed)?;
        paths.push(MirrorSource { path, credential });
    }
    debug!(user_id = %user_id, reconcile_at, active = paths.len(), "mirror snapshot loaded");
    Ok(MirrorSnapshot {
        reconcile_at,
        paths,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    use {
        mirrorplane_entitlement::{Capability, PlanTier, Platform},
        mirrorplane_store::{NewBot, NewMirrorPath, NewRedeemItem, SqliteControlStore, StoreError},
        mirrorplane_vault::VaultError,
    };

    const T0: i64 = 1_700_000_000_000;

    async fn seeded() -> (SqliteControlStore, Vault) {
        let store = SqliteControlStore::new("sqlite::memory:").await.unwrap();
        (store, Vault::new("fleet-snapshot-secret"))
    }

    #[tokio::test]
    async fn bot_snapshot_carries_opened_token_and_children() {
        let (store, vault) = seeded().await;
        let bot = store
            .create_bot(
                NewBot {
                    name: "mirror-1".into(),
                    client_id: "client".into(),
                    token_sealed: vault.seal("discord-token-abc").unwrap(),
                    guild_id: "guild".into(),
                    admin_role_id: None,
                    trial_role_id: None,
                    features: [Capability::Base].into_iter().collect(),
                },
                T0,
            )
            .await
            .unwrap();
        store
            .create_redeem_item(
                NewRedeemItem {
                    bot_id: bot.id.clone(),
                    role_id: "r1".into(),
                    role_name: "VIP".into(),
                    cost: 100,
                    duration_days: 30,
                },
                T0 + 1,
            )
            .await
            .unwrap();

        let snapshot = load_bot_snapshot(&store, &vault, &bot.id).await.unwrap();
        assert_eq!(snapshot.token, "discord-token-abc");
        assert_eq!(snapshot.point_config, None);
        assert_eq!(snapshot.redeem_items.len(), 1);
        assert_eq!(snapshot.reconcile_at(), T0 + 1);
    }

    #[tokio::test]
    async fn missing_bot_surfaces_store_not_found() {
        let (store, vault) = seeded().await;
        let err = load_bot_snapshot(&store, &vault, "ghost").await.unwrap_err();
        assert!(matches!(err, FleetError::Store(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn wrong_key_surfaces_vault_authentication() {
        let (store, vault) = seeded().await;
        let bot = store
            .create_bot(
                NewBot {
                    name: "b".into(),
                    client_id: "c".into(),
                    token_sealed: vault.seal("tok").unwrap(),
                    guild_id: "g".into(),
                    admin_role_id: None,
                    trial_role_id: None,
                    features: [Capability::Base].into_iter().collect(),
                },
                T0,
            )
            .await
            .unwrap();

        let other = Vault::new("a-different-secret");
        let err = load_bot_snapshot(&store, &other, &bot.id).await.unwrap_err();
        assert!(matches!(err, FleetError::Vault(VaultError::Authentication)));
    }

    #[tokio::test]
    async fn mirror_snapshot_contains_only_active_paths() {
        let (store, vault) = seeded().await;
        store
            .set_subscription("u1", PlanTier::Starter, None, T0)
            .await
            .unwrap();
        let a = store
            .create_mirror_path(
                NewMirrorPath {
                    user_id: "u1".into(),
                    platform: Platform::Discord,
                    source_sealed: vault.seal("source-cred-a").unwrap(),
                },
                T0,
            )
            .await
            .unwrap();
        store
            .create_mirror_path(
                NewMirrorPath {
                    user_id: "u1".into(),
                    platform: Platform::Discord,
                    source_sealed: vault.seal("source-cred-b").unwrap(),
                },
                T0 + 1,
            )
            .await
            .unwrap();
        store.activate_mirror_path(&a.id, T0 + 2).await.unwrap();

        let snapshot = load_mirror_snapshot(&store, &vault, "u1").await.unwrap();
        assert_eq!(snapshot.paths.len(), 1);
        assert_eq!(snapshot.paths[0].path.id, a.id);
        assert_eq!(snapshot.paths[0].credential, "source-cred-a");
        assert_eq!(
            snapshot.reconcile_at,
            store.get_mirror_signal("u1").await.unwrap()
        );
    }

    #[tokio::test]
    async fn mirror_snapshot_for_unknown_user_is_empty() {
        let (store, vault) = seeded().await;
        let snapshot = load_mirror_snapshot(&store, &vault, "nobody").await.unwrap();
        assert_eq!(snapshot.reconcile_at, 0);
        assert!(snapshot.paths.is_empty());
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let source = MirrorSource {
            path: MirrorPath {
                id: "p1".into(),
                user_id: "u1".into(),
                platform: Platform::Discord,
                source_sealed: "blob".into(),
                blacklist: vec![],
                active: true,
                created_at: T0,
            },
            credential: "super-secret-credential".into(),
        };
        let rendered = format!("{source:?}");
        assert!(!rendered.contains("super-secret-credential"));
        assert!(rendered.contains("supe****"));
    }
}

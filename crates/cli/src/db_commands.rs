use {anyhow::Context, clap::Subcommand, secrecy::ExposeSecret};

use {
    mirrorplane_config::MirrorplaneConfig,
    mirrorplane_store::{ControlStore, SqliteControlStore},
    mirrorplane_vault::Vault,
};

#[derive(Subcommand)]
pub enum DbAction {
    /// Seal any credential column still holding legacy plaintext.
    MigrateSecrets,
}

pub async fn handle_db(action: DbAction, config: &MirrorplaneConfig) -> anyhow::Result<()> {
    match action {
        DbAction::MigrateSecrets => migrate_secrets(config).await,
    }
}

async fn migrate_secrets(config: &MirrorplaneConfig) -> anyhow::Result<()> {
    let secret = config.vault.secret.as_ref().context(
        "vault.secret is not configured; set MIRRORPLANE_VAULT_SECRET or add it to mirrorplane.toml",
    )?;
    let vault = Vault::new(secret.expose_secret());
    let store = SqliteControlStore::new(&config.database.url).await?;

    let report = store.migrate_plaintext_secrets(&vault).await?;
    if report.total() == 0 {
        println!("Nothing to do; every stored credential is already sealed.");
    } else {
        println!(
            "Sealed {} bot token(s) and {} mirror credential(s).",
            report.bots_resealed, report.mirrors_resealed
        );
    }
    Ok(())
}

use clap::Subcommand;

use {
    mirrorplane_common::time::now_ms,
    mirrorplane_config::MirrorplaneConfig,
    mirrorplane_fleet::fleet_status,
    mirrorplane_store::{ControlStore, SqliteControlStore},
};

#[derive(Subcommand)]
pub enum FleetAction {
    /// Show every bot with its liveness and pending-reload state.
    Status,
}

pub async fn handle_fleet(action: FleetAction, config: &MirrorplaneConfig) -> anyhow::Result<()> {
    match action {
        FleetAction::Status => print_status(config).await,
    }
}

async fn print_status(config: &MirrorplaneConfig) -> anyhow::Result<()> {
    let store = SqliteControlStore::new(&config.database.url).await?;
    let bots = store.list_bots().await?;
    if bots.is_empty() {
        println!("No bots registered.");
        return Ok(());
    }

    println!(
        "{:<24} {:<8} {:<8} {:<26} SIGNAL",
        "NAME", "ACTIVE", "ONLINE", "LAST HEARTBEAT"
    );
    for status in fleet_status(bots, now_ms()) {
        let heartbeat = status
            .last_heartbeat_at
            .and_then(|ms| chrono::DateTime::from_timestamp_millis(ms).map(|ts| ts.to_rfc3339()))
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<24} {:<8} {:<8} {:<26} {}",
            status.name,
            if status.active { "yes" } else { "no" },
            if status.online { "yes" } else { "no" },
            heartbeat,
            status.reconcile_at,
        );
    }
    Ok(())
}

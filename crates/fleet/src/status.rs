//! Dashboard rows derived from stored bot state.

use serde::Serialize;

use mirrorplane_store::BotIdentity;

use crate::liveness::is_online;

/// One fleet dashboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetStatus {
    pub bot_id: String,
    pub name: String,
    pub active: bool,
    pub online: bool,
    pub last_heartbeat_at: Option<i64>,
    pub reconcile_at: i64,
}

/// Derive dashboard rows for every bot at `now_ms`.
pub fn fleet_status(bots: Vec<BotIdentity>, now_ms: i64) -> Vec<FleetStatus> {
    bots.into_iter()
        .map(|bot| FleetStatus {
            online: is_online(bot.last_heartbeat_at, now_ms),
            bot_id: bot.id,
            name: bot.name,
            active: bot.active,
            last_heartbeat_at: bot.last_heartbeat_at,
            reconcile_at: bot.reconcile_at,
        })
        .collect()
}

//! Abuse-report endpoint for the external reporter bot.
//!
//! The wire keys are camelCase; the reporter's format predates this
//! service and is kept as-is.

use {
    axum::{Json, extract::State},
    serde::{Deserialize, Serialize},
};

use {mirrorplane_common::time::now_ms, mirrorplane_store::StoreError};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub config_ids: Vec<String>,
    pub sender_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportOutcome {
    /// Sender appended to the blacklist; the path's signal advanced.
    Added,
    /// Sender was already listed; nothing changed.
    Skipped,
    /// No such mirror path.
    Unknown,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub config_id: String,
    pub outcome: ReportOutcome,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub results: Vec<ReportEntry>,
}

/// Appends the sender to each listed path's blacklist. The union is
/// idempotent and never removes entries; unknown ids are reported, not
/// treated as failures, so one stale id cannot block the rest of a batch.
pub async fn report_sender(
    State(state): State<AppState>,
    Json(body): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    if body.sender_id.trim().is_empty() {
        return Err(ApiError::Validation("senderId must not be empty".into()));
    }

    let now = now_ms();
    let mut results = Vec::with_capacity(body.config_ids.len());
    for config_id in body.config_ids {
        let outcome = match state
            .store
            .add_to_blacklist(&config_id, &body.sender_id, now)
            .await
        {
            Ok(true) => ReportOutcome::Added,
            Ok(false) => ReportOutcome::Skipped,
            Err(StoreError::NotFound) => ReportOutcome::Unknown,
            Err(err) => return Err(err.into()),
        };
        results.push(ReportEntry { config_id, outcome });
    }
    Ok(Json(ReportResponse { results }))
}

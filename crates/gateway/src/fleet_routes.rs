//! Fleet-wide status overview.

use axum::{Json, extract::State};

use {
    mirrorplane_common::time::now_ms,
    mirrorplane_fleet::{FleetStatus, fleet_status},
};

use crate::{error::ApiError, state::AppState};

/// One row per bot with liveness derived at read time.
pub async fn fleet_overview(
    State(state): State<AppState>,
) -> Result<Json<Vec<FleetStatus>>, ApiError> {
    let bots = state.store.list_bots().await?;
    Ok(Json(fleet_status(bots, now_ms())))
}

//! Admin CRUD for worker bots: identity, capability grants, token rotation,
//! the point economy, and redeemable roles.

use std::str::FromStr;

use {
    axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
    },
    serde::{Deserialize, Serialize},
};

use {
    mirrorplane_common::time::now_ms,
    mirrorplane_entitlement::{Capability, CapabilitySet, close_over_dependencies},
    mirrorplane_store::{BotIdentity, NewBot, NewRedeemItem, PointConfig, RedeemItem},
};

use crate::{error::ApiError, state::AppState};

// ── Views ───────────────────────────────────────────────────────────────────

/// Bot row as returned over the API. Sealed token blobs never leave the
/// store tier.
#[derive(Debug, Serialize)]
pub struct BotView {
    pub id: String,
    pub name: String,
    pub client_id: String,
    pub guild_id: String,
    pub admin_role_id: Option<String>,
    pub trial_role_id: Option<String>,
    pub features: CapabilitySet,
    pub active: bool,
    pub last_heartbeat_at: Option<i64>,
    pub reconcile_at: i64,
    pub created_at: i64,
}

impl From<BotIdentity> for BotView {
    fn from(bot: BotIdentity) -> Self {
        Self {
            id: bot.id,
            name: bot.name,
            client_id: bot.client_id,
            guild_id: bot.guild_id,
            admin_role_id: bot.admin_role_id,
            trial_role_id: bot.trial_role_id,
            features: bot.features,
            active: bot.active,
            last_heartbeat_at: bot.last_heartbeat_at,
            reconcile_at: bot.reconcile_at,
            created_at: bot.created_at,
        }
    }
}

// ── Bot identity ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBotRequest {
    pub name: String,
    pub client_id: String,
    /// Plaintext worker token; sealed before it reaches the store.
    pub token: String,
    pub guild_id: String,
    #[serde(default)]
    pub admin_role_id: Option<String>,
    #[serde(default)]
    pub trial_role_id: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

pub async fn create_bot(
    State(state): State<AppState>,
    Json(body): Json<CreateBotRequest>,
) -> Result<Json<BotView>, ApiError> {
    if body.token.trim().is_empty() {
        return Err(ApiError::Validation("token must not be empty".into()));
    }
    let features = parse_features(&body.features)?;
    let token_sealed = state.vault.seal(&body.token).map_err(ApiError::internal)?;
    let new = NewBot {
        name: body.name,
        client_id: body.client_id,
        token_sealed,
        guild_id: body.guild_id,
        admin_role_id: body.admin_role_id,
        trial_role_id: body.trial_role_id,
        features,
    };
    let bot = state.store.create_bot(new, now_ms()).await?;
    Ok(Json(bot.into()))
}

pub async fn list_bots(State(state): State<AppState>) -> Result<Json<Vec<BotView>>, ApiError> {
    let bots = state.store.list_bots().await?;
    Ok(Json(bots.into_iter().map(BotView::from).collect()))
}

pub async fn get_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BotView>, ApiError> {
    let bot = state.store.get_bot(&id).await?;
    Ok(Json(bot.into()))
}

pub async fn delete_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_bot(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

pub async fn set_bot_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActiveRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .set_bot_active(&id, body.active, now_ms())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Capabilities ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FeaturesRequest {
    pub features: Vec<String>,
}

/// Replaces the bot's capability set. The stored set is the dependency
/// closure of what was requested, so granting `elite` also grants `base`.
pub async fn set_bot_features(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FeaturesRequest>,
) -> Result<Json<BotView>, ApiError> {
    let features = parse_features(&body.features)?;
    let bot = state.store.set_bot_features(&id, features, now_ms()).await?;
    Ok(Json(bot.into()))
}

fn parse_features(raw: &[String]) -> Result<CapabilitySet, ApiError> {
    let mut caps = CapabilitySet::new();
    for name in raw {
        let cap =
            Capability::from_str(name).map_err(|err| ApiError::Validation(err.to_string()))?;
        caps.insert(cap);
    }
    Ok(close_over_dependencies(&caps))
}

// ── Token rotation ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

pub async fn rotate_bot_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TokenRequest>,
) -> Result<StatusCode, ApiError> {
    if body.token.trim().is_empty() {
        return Err(ApiError::Validation("token must not be empty".into()));
    }
    let token_sealed = state.vault.seal(&body.token).map_err(ApiError::internal)?;
    state
        .store
        .set_bot_token(&id, &token_sealed, now_ms())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Point economy ───────────────────────────────────────────────────────────

/// Stores the full config; an upsert replaces the previous row outright.
pub async fn put_point_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(config): Json<PointConfig>,
) -> Result<Json<PointConfig>, ApiError> {
    state
        .store
        .upsert_point_config(&id, &config, now_ms())
        .await?;
    Ok(Json(config))
}

pub async fn get_point_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PointConfig>, ApiError> {
    match state.store.get_point_config(&id).await? {
        Some(config) => Ok(Json(config)),
        None => Err(ApiError::NotFound),
    }
}

// ── Redeemable roles ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateRedeemRequest {
    pub role_id: String,
    pub role_name: String,
    pub cost: i64,
    pub duration_days: i64,
}

pub async fn create_redeem(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CreateRedeemRequest>,
) -> Result<Json<RedeemItem>, ApiError> {
    let new = NewRedeemItem {
        bot_id: id,
        role_id: body.role_id,
        role_name: body.role_name,
        cost: body.cost,
        duration_days: body.duration_days,
    };
    let item = state.store.create_redeem_item(new, now_ms()).await?;
    Ok(Json(item))
}

pub async fn list_redeems(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RedeemItem>>, ApiError> {
    let items = state.store.list_redeem_items(&id).await?;
    Ok(Json(items))
}

pub async fn delete_redeem(
    State(state): State<AppState>,
    Path((id, redeem_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_redeem_item(&id, &redeem_id, now_ms())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mirrorplane_entitlement::Capability;

    use super::parse_features;

    #[test]
    fn features_are_closed_over_dependencies() {
        let caps = parse_features(&["elite".to_string()]).unwrap();
        assert!(caps.contains(&Capability::Base));
        assert!(caps.contains(&Capability::Elite));
    }

    #[test]
    fn unknown_feature_names_are_rejected_with_detail() {
        let err = parse_features(&["turbo".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown capability"));
    }
}

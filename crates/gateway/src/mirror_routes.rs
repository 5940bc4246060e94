//! Admin routes for mirror paths and per-user subscription state.

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
    mirrorplane_entitlement::{ActivationPlan, PlanTier, Platform},
    mirrorplane_store::{MirrorPath, NewMirrorPath, Subscription},
};

use crate::{error::ApiError, state::AppState};

// ── Views ───────────────────────────────────────────────────────────────────

/// Mirror path as returned over the API. Sealed credential blobs never
/// leave the store tier.
#[derive(Debug, Serialize)]
pub struct MirrorView {
    pub id: String,
    pub user_id: String,
    pub platform: Platform,
    pub blacklist: Vec<String>,
    pub active: bool,
    pub created_at: i64,
}

impl From<MirrorPath> for MirrorView {
    fn from(path: MirrorPath) -> Self {
        Self {
            id: path.id,
            user_id: path.user_id,
            platform: path.platform,
            blacklist: path.blacklist,
            active: path.active,
            created_at: path.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub user_id: String,
    pub tier: PlanTier,
    pub expires_at: Option<i64>,
    /// Tier after read-time expiry degradation; what entitlement checks use.
    pub effective_tier: PlanTier,
}

impl SubscriptionView {
    fn at(sub: Subscription, now_ms: i64) -> Self {
        Self {
            effective_tier: sub.effective_tier(now_ms),
            user_id: sub.user_id,
            tier: sub.tier,
            expires_at: sub.expires_at,
        }
    }
}

/// Activation flips applied by a reconcile pass.
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub activated: Vec<String>,
    pub deactivated: Vec<String>,
}

impl From<ActivationPlan> for ReconcileResponse {
    fn from(plan: ActivationPlan) -> Self {
        Self {
            activated: plan.activate,
            deactivated: plan.deactivate,
        }
    }
}

// ── Mirror paths ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateMirrorRequest {
    pub user_id: String,
    pub platform: String,
    /// Plaintext source-account credential; sealed before storage.
    pub source_credential: String,
}

/// Registers a path. Paths start inactive; quota is checked at activation.
pub async fn create_mirror(
    State(state): State<AppState>,
    Json(body): Json<CreateMirrorRequest>,
) -> Result<Json<MirrorView>, ApiError> {
    let platform =
        Platform::from_str(&body.platform).map_err(|err| ApiError::Validation(err.to_string()))?;
    if body.source_credential.trim().is_empty() {
        return Err(ApiError::Validation(
            "source_credential must not be empty".into(),
        ));
    }
    let source_sealed = state
        .vault
        .seal(&body.source_credential)
        .map_err(ApiError::internal)?;
    let new = NewMirrorPath {
        user_id: body.user_id,
        platform,
        source_sealed,
    };
    let path = state.store.create_mirror_path(new, now_ms()).await?;
    Ok(Json(path.into()))
}

pub async fn list_user_mirrors(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MirrorView>>, ApiError> {
    let paths = state.store.list_mirror_paths(&user_id).await?;
    Ok(Json(paths.into_iter().map(MirrorView::from).collect()))
}

pub async fn activate_mirror(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MirrorView>, ApiError> {
    let path = state.store.activate_mirror_path(&id, now_ms()).await?;
    Ok(Json(path.into()))
}

pub async fn deactivate_mirror(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MirrorView>, ApiError> {
    let path = state.store.deactivate_mirror_path(&id, now_ms()).await?;
    Ok(Json(path.into()))
}

pub async fn delete_mirror(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_mirror_path(&id, now_ms()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Subscriptions ───────────────────────────────────────────────────────────

pub async fn get_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SubscriptionView>, ApiError> {
    let sub = state.store.get_subscription(&user_id).await?;
    Ok(Json(SubscriptionView::at(sub, now_ms())))
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub tier: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Support override for a user's tier, outside the billing flow. Activation
/// state is reconciled against the new tier in the same transaction.
pub async fn put_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<SubscriptionRequest>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let tier =
        PlanTier::from_str(&body.tier).map_err(|err| ApiError::Validation(err.to_string()))?;
    let plan = state
        .store
        .set_subscription(&user_id, tier, body.expires_at, now_ms())
        .await?;
    Ok(Json(plan.into()))
}

/// Audit sweep: recomputes the user's activation set against their current
/// entitlement and applies any flips.
pub async fn reconcile_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let plan = state.store.reconcile_user_mirrors(&user_id, now_ms()).await?;
    Ok(Json(plan.into()))
}

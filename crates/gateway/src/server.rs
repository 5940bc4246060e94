//! Router assembly and server startup.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router, middleware,
        response::IntoResponse,
        routing::{delete, get, post, put},
    },
    secrecy::ExposeSecret,
    tokio::net::TcpListener,
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::info,
};

use {
    mirrorplane_config::MirrorplaneConfig,
    mirrorplane_store::{ControlStore, SqliteControlStore},
    mirrorplane_vault::Vault,
};

use crate::{
    auth, billing_routes, bot_routes, fleet_routes, mirror_routes, report_routes, state::AppState,
    throttle,
};

/// Build the control-plane router (shared between production startup and
/// tests).
///
/// Layer order matters: the throttle gate wraps both auth domains so
/// unauthenticated mutation floods are counted before any token check runs.
pub fn build_control_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/api/fleet", get(fleet_routes::fleet_overview))
        .route(
            "/api/bots",
            post(bot_routes::create_bot).get(bot_routes::list_bots),
        )
        .route(
            "/api/bots/{id}",
            get(bot_routes::get_bot).delete(bot_routes::delete_bot),
        )
        .route("/api/bots/{id}/active", put(bot_routes::set_bot_active))
        .route("/api/bots/{id}/features", put(bot_routes::set_bot_features))
        .route("/api/bots/{id}/token", put(bot_routes::rotate_bot_token))
        .route(
            "/api/bots/{id}/points",
            put(bot_routes::put_point_config).get(bot_routes::get_point_config),
        )
        .route(
            "/api/bots/{id}/redeems",
            post(bot_routes::create_redeem).get(bot_routes::list_redeems),
        )
        .route(
            "/api/bots/{id}/redeems/{redeem_id}",
            delete(bot_routes::delete_redeem),
        )
        .route("/api/mirrors", post(mirror_routes::create_mirror))
        .route("/api/mirrors/{id}", delete(mirror_routes::delete_mirror))
        .route(
            "/api/mirrors/{id}/activate",
            post(mirror_routes::activate_mirror),
        )
        .route(
            "/api/mirrors/{id}/deactivate",
            post(mirror_routes::deactivate_mirror),
        )
        .route(
            "/api/users/{user_id}/mirrors",
            get(mirror_routes::list_user_mirrors),
        )
        .route(
            "/api/users/{user_id}/subscription",
            get(mirror_routes::get_subscription).put(mirror_routes::put_subscription),
        )
        .route(
            "/api/users/{user_id}/reconcile",
            post(mirror_routes::reconcile_user),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let report = Router::new()
        .route("/api/report", post(report_routes::report_sender))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_report,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/hooks/payment/{slug}",
            post(billing_routes::payment_webhook),
        )
        .merge(admin)
        .merge(report)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            throttle::throttle_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Start the control-plane HTTP server.
///
/// Refuses to start without a vault secret: every bot token and mirror
/// credential passes through the sealer, and an ephemeral key would orphan
/// all previously sealed rows on restart.
pub async fn start_control_plane(config: MirrorplaneConfig) -> anyhow::Result<()> {
    let Some(vault_secret) = config.vault.secret.as_ref() else {
        anyhow::bail!(
            "vault.secret is not configured; set MIRRORPLANE_VAULT_SECRET or add it to mirrorplane.toml"
        );
    };
    let vault = Arc::new(Vault::new(vault_secret.expose_secret()));

    let store = SqliteControlStore::new(&config.database.url).await?;

    // Pre-vault deployments stored credentials in the clear; seal whatever
    // is still readable as plaintext before serving.
    store.migrate_plaintext_secrets(&vault).await?;

    let addr = config.server.listen_addr();
    let state = AppState::new(Arc::new(store), vault, &config);
    let app = build_control_app(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "control plane listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

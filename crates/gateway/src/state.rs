//! Shared state threaded through every handler.

use std::sync::Arc;

use secrecy::Secret;

use {
    mirrorplane_config::{BillingConfig, MirrorplaneConfig},
    mirrorplane_store::ControlStore,
    mirrorplane_vault::Vault,
};

use crate::{
    auth::GatewayAuth,
    throttle::{MemoryThrottleStore, ThrottleStore},
};

/// Payment-provider secrets for the webhook surface.
pub struct BillingGate {
    pub server_key: Option<Secret<String>>,
    pub webhook_slug: Option<Secret<String>>,
}

impl BillingGate {
    #[must_use]
    pub fn from_config(billing: &BillingConfig) -> Self {
        Self {
            server_key: billing.server_key.clone(),
            webhook_slug: billing.webhook_slug.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ControlStore>,
    pub vault: Arc<Vault>,
    pub auth: Arc<GatewayAuth>,
    pub billing: Arc<BillingGate>,
    pub throttle: Arc<dyn ThrottleStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn ControlStore>, vault: Arc<Vault>, config: &MirrorplaneConfig) -> Self {
        if config.auth.admin_token.is_none() {
            tracing::warn!("auth.admin_token is not configured; the admin API rejects every request");
        }
        if config.auth.report_token.is_none() {
            tracing::warn!(
                "auth.report_token is not configured; the report endpoint rejects every request"
            );
        }
        Self {
            store,
            vault,
            auth: Arc::new(GatewayAuth::from_config(&config.auth)),
            billing: Arc::new(BillingGate::from_config(&config.billing)),
            throttle: Arc::new(MemoryThrottleStore::new(config.throttle.max_actions)),
        }
    }
}

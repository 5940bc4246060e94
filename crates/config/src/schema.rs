//! Config schema types.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorplaneConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub vault: VaultConfig,
    pub auth: AuthConfig,
    pub billing: BillingConfig,
    pub throttle: ThrottleConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8480,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Durable store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL. `mode=rwc` creates the file on first run.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://mirrorplane.db?mode=rwc".into(),
        }
    }
}

/// Vault key material.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault secret. 64 hex chars decode to the 32-byte key verbatim; any
    /// other value is padded or truncated.
    #[serde(serialize_with = "serialize_option_secret")]
    pub secret: Option<Secret<String>>,
}

/// Bearer tokens for the admin and report surfaces. A missing token disables
/// its surface entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(serialize_with = "serialize_option_secret")]
    pub admin_token: Option<Secret<String>>,
    #[serde(serialize_with = "serialize_option_secret")]
    pub report_token: Option<Secret<String>>,
}

/// Payment-provider knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Provider server key used inside the notification signature.
    #[serde(serialize_with = "serialize_option_secret")]
    pub server_key: Option<Secret<String>>,
    /// URL-embedded webhook secret (`/hooks/payment/{slug}`).
    #[serde(serialize_with = "serialize_option_secret")]
    pub webhook_slug: Option<Secret<String>>,
}

/// Mutation throttling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Maximum mutating requests per actor inside one 60-second window.
    pub max_actions: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self { max_actions: 30 }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

//! Configuration loading for the control plane.
//!
//! Config files: `mirrorplane.toml` or `mirrorplane.json`, searched in `./`
//! then the user config directory. String values may hold `${ENV_VAR}`
//! placeholders, and `MIRRORPLANE_*` variables override individual fields
//! after the file is parsed.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    env_subst::substitute_env,
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{
        AuthConfig, BillingConfig, DatabaseConfig, MirrorplaneConfig, ServerConfig,
        ThrottleConfig, VaultConfig,
    },
};

//! Config discovery, loading, and env overrides.

use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::MirrorplaneConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["mirrorplane.toml", "mirrorplane.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<MirrorplaneConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./mirrorplane.{toml,json}` (project-local)
/// 2. `<user config dir>/mirrorplane/mirrorplane.{toml,json}`
///
/// Returns `MirrorplaneConfig::default()` if no config file is found.
pub fn discover_and_load() -> MirrorplaneConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(config) => return config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    MirrorplaneConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/mirrorplane/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mirrorplane").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<MirrorplaneConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

/// Apply `MIRRORPLANE_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut MirrorplaneConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(
    config: &mut MirrorplaneConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("MIRRORPLANE_BIND") {
        config.server.bind = v;
    }
    if let Some(v) = lookup("MIRRORPLANE_PORT") {
        match v.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %v, "MIRRORPLANE_PORT is not a port, ignoring"),
        }
    }
    if let Some(v) = lookup("MIRRORPLANE_DATABASE_URL") {
        config.database.url = v;
    }
    if let Some(v) = lookup("MIRRORPLANE_VAULT_SECRET") {
        config.vault.secret = Some(Secret::new(v));
    }
    if let Some(v) = lookup("MIRRORPLANE_ADMIN_TOKEN") {
        config.auth.admin_token = Some(Secret::new(v));
    }
    if let Some(v) = lookup("MIRRORPLANE_REPORT_TOKEN") {
        config.auth.report_token = Some(Secret::new(v));
    }
    if let Some(v) = lookup("MIRRORPLANE_BILLING_SERVER_KEY") {
        config.billing.server_key = Some(Secret::new(v));
    }
    if let Some(v) = lookup("MIRRORPLANE_WEBHOOK_SLUG") {
        config.billing.webhook_slug = Some(Secret::new(v));
    }
    if let Some(v) = lookup("MIRRORPLANE_THROTTLE_MAX") {
        match v.parse() {
            Ok(max) => config.throttle.max_actions = max,
            Err(_) => warn!(value = %v, "MIRRORPLANE_THROTTLE_MAX is not a number, ignoring"),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    use secrecy::ExposeSecret;

    #[test]
    fn loads_toml_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirrorplane.toml");
        std::fs::write(
            &path,
            "[server]\nbind = \"0.0.0.0\"\nport = 9999\n\n[database]\nurl = \"sqlite::memory:\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.listen_addr(), "0.0.0.0:9999");
        assert_eq!(config.database.url, "sqlite::memory:");
    }

    #[test]
    fn loads_json_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirrorplane.json");
        std::fs::write(&path, r#"{"throttle": {"max_actions": 5}}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.throttle.max_actions, 5);
        assert_eq!(config.server.port, 8480);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirrorplane.yaml");
        std::fs::write(&path, "server:\n  port: 1\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/definitely/not/here.toml")).is_err());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = MirrorplaneConfig::default();
        apply_overrides_with(&mut config, |name| match name {
            "MIRRORPLANE_PORT" => Some("7001".into()),
            "MIRRORPLANE_VAULT_SECRET" => Some("from-env".into()),
            "MIRRORPLANE_THROTTLE_MAX" => Some("3".into()),
            _ => None,
        });

        assert_eq!(config.server.port, 7001);
        assert_eq!(config.vault.secret.unwrap().expose_secret(), "from-env");
        assert_eq!(config.throttle.max_actions, 3);
    }

    #[test]
    fn unparsable_numeric_override_keeps_the_default() {
        let mut config = MirrorplaneConfig::default();
        apply_overrides_with(&mut config, |name| {
            (name == "MIRRORPLANE_PORT").then(|| "many".to_string())
        });
        assert_eq!(config.server.port, 8480);
    }
}

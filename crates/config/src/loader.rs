use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::RelayConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "tokenrelay.toml",
    "tokenrelay.yaml",
    "tokenrelay.yml",
    "tokenrelay.json",
];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, config discovery only looks in
/// this directory and the credential store defaults to living there too.
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<RelayConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./tokenrelay.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/tokenrelay/tokenrelay.{toml,yaml,yml,json}` (user-global)
///
/// Returns `RelayConfig::default()` if no config file is found or it fails to parse.
pub fn discover_and_load() -> RelayConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return RelayConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            RelayConfig::default()
        },
    }
}

/// Find the first config file in standard locations.
///
/// When a config dir override is set, only that directory is searched.
fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return first_existing(&dir);
    }

    first_existing(Path::new(".")).or_else(|| config_dir().and_then(|dir| first_existing(&dir)))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the config directory: override, or `~/.config/tokenrelay/` on all platforms.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return Some(dir);
    }
    home_dir().map(|h| h.join(".config").join("tokenrelay"))
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<RelayConfig> {
    match extension(path) {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        ext => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("tokenrelay.yaml");
        std::fs::write(
            &yaml,
            "credentials:\n  crm:\n    refreshToken: r\n    refreshUrl: https://a/refresh\n    testUrl: https://a/me\n",
        )
        .unwrap();
        let cfg = load_config(&yaml).unwrap();
        assert_eq!(cfg.credential("crm").unwrap().refresh_url, "https://a/refresh");

        let json = dir.path().join("tokenrelay.json");
        std::fs::write(&json, r#"{"store":{"path":"/var/lib/creds.json"}}"#).unwrap();
        let cfg = load_config(&json).unwrap();
        assert_eq!(cfg.store.path, Some(PathBuf::from("/var/lib/creds.json")));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenrelay.ini");
        std::fs::write(&path, "x=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/tokenrelay.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tokenrelay.toml"));
    }

    #[test]
    fn override_dir_limits_discovery() {
        let dir = tempfile::tempdir().unwrap();
        set_config_dir(dir.path().to_path_buf());

        assert!(discover_and_load().credentials.is_empty());
        assert_eq!(config_dir(), Some(dir.path().to_path_buf()));

        std::fs::write(
            dir.path().join("tokenrelay.toml"),
            "[credentials.crm]\nrefreshToken = \"r\"\nrefreshUrl = \"https://a/refresh\"\ntestUrl = \"https://a/me\"\n",
        )
        .unwrap();
        let reloaded = discover_and_load();
        assert_eq!(reloaded.credential("crm").unwrap().refresh_token, "r");

        std::fs::write(dir.path().join("tokenrelay.toml"), "credentials = 3").unwrap();
        assert!(discover_and_load().credentials.is_empty());

        clear_config_dir();
    }
}

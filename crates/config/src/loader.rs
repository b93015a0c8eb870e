use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::HookrelayConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "hookrelay.toml",
    "hookrelay.yaml",
    "hookrelay.yml",
    "hookrelay.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<HookrelayConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./hookrelay.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/hookrelay/hookrelay.{toml,yaml,yml,json}` (user-global)
///
/// Returns `HookrelayConfig::default()` if no config file is found or the
/// file cannot be loaded.
pub fn discover_and_load() -> HookrelayConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    HookrelayConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/hookrelay/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hookrelay").map(|d| d.config_dir().to_path_buf())
}

/// Apply `HOOKRELAY_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut HookrelayConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

pub(crate) fn apply_env_overrides_with(
    config: &mut HookrelayConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(urls) = lookup("HOOKRELAY_WEBHOOK_URLS") {
        config.webhook.urls = urls
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect();
        debug!(count = config.webhook.urls.len(), "webhook urls overridden from env");
    }
    if let Some(secret) = lookup("HOOKRELAY_WEBHOOK_SECRET") {
        config.webhook.secret = Secret::new(secret);
        debug!("webhook secret overridden from env");
    }
    if let Some(path) = lookup("HOOKRELAY_MEDIA_PATH") {
        config.media.path = PathBuf::from(path);
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<HookrelayConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let parse_err = |message: String| Error::Parse {
        path: path.to_path_buf(),
        message,
    };

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "json" => serde_json::from_str(raw).map_err(|e| parse_err(e.to_string())),
        _ => Err(Error::UnsupportedFormat {
            ext: ext.to_string(),
        }),
    }
}

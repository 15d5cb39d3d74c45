use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::RollcallConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "rollcall.toml",
    "rollcall.yaml",
    "rollcall.yml",
    "rollcall.json",
];

/// Environment variables that override `discord.token`, highest priority
/// first. `BOT_TOKEN` is accepted for existing deployments.
const TOKEN_ENV_VARS: &[&str] = &["ROLLCALL_DISCORD_TOKEN", "BOT_TOKEN"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<RollcallConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_config(&substitute_env(&raw), path)
}

/// Load config from `explicit` if given, otherwise from the first standard
/// location that exists. Falls back to defaults when nothing is found.
///
/// An explicit path that cannot be loaded is an error; a discovered file
/// that fails to parse is logged and replaced by defaults.
pub fn discover_and_load(explicit: Option<&Path>) -> Result<RollcallConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config");
        return load_config(path);
    }
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return Ok(cfg),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    Ok(RollcallConfig::default())
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./rollcall.{toml,yaml,yml,json}`
/// 2. `<user config dir>/rollcall/rollcall.{toml,yaml,yml,json}`
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (e.g. `~/.config/rollcall/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "rollcall").map(|d| d.config_dir().to_path_buf())
}

/// Apply environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut RollcallConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut RollcallConfig, lookup: impl Fn(&str) -> Option<String>) {
    let Some((var, token)) = TOKEN_ENV_VARS
        .iter()
        .find_map(|var| lookup(var).filter(|v| !v.is_empty()).map(|v| (*var, v)))
    else {
        return;
    };
    debug!(var, "discord token taken from environment");
    if !config.discord.is_object() {
        config.discord = serde_json::Value::Object(serde_json::Map::new());
    }
    if let Some(section) = config.discord.as_object_mut() {
        section.insert("token".into(), serde_json::Value::String(token));
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<RollcallConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

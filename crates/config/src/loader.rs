use std::path::{Path, PathBuf};

use {anyhow::Context, tracing::debug};

use crate::{env_subst::substitute_env, schema::PosterConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["hgpost.json", "hgpost.toml", "hgpost.yaml", "hgpost.yml"];

/// Load, substitute and validate the config at `path` (format chosen by
/// file extension, JSON when there is none).
pub fn load_config(path: &Path) -> anyhow::Result<PosterConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    let config = parse_config(&raw, path)
        .with_context(|| format!("invalid config at {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config at {}", path.display()))?;
    debug!(
        path = %path.display(),
        destinations = config.issues.len(),
        "loaded config"
    );
    Ok(config)
}

/// Find a config file in standard locations.
///
/// Search order:
/// 1. `./hgpost.{json,toml,yaml,yml}` (project-local)
/// 2. `~/.config/hgpost/hgpost.{json,toml,yaml,yml}` (user-global)
pub fn discover_config_path() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns `~/.config/hgpost/` on all platforms.
pub fn config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("hgpost"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PosterConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match ext {
        "json" => Ok(serde_json::from_str(raw)?),
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

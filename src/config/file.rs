//! Configuration file discovery
//!
//! Finds a config file in the standard locations and layers environment
//! overrides on top of it.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{AppConfig, EnvConfig};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./golden-runner.yaml",
    "./golden-runner.yml",
    "./.golden-runner.yaml",
    "~/.config/golden-runner/config.yaml",
];

/// Find a configuration file in the standard locations
pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_LOCATIONS
        .iter()
        .map(|location| expand_path(location))
        .find(|path| path.exists())
}

/// Build the effective configuration from file and environment.
///
/// An explicit path wins over `GOLDEN_RUNNER_CONFIG`, which wins over the
/// standard locations. With no file at all the defaults are used.
pub fn resolve(explicit: Option<&Path>, env: &EnvConfig) -> Result<AppConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| env.config_file.as_ref().map(PathBuf::from))
        .or_else(find_config_file);

    let mut config = match path {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            AppConfig::load(&path)?
        }
        None => AppConfig::default(),
    };

    env.apply(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

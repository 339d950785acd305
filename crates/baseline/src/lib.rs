//! baseline library - Baseline feature references in editors and on the command line
//!
//! This library exposes the pieces behind the `baseline` binary for testing
//! and embedding purposes.

pub mod config;
pub mod data;
pub mod lsp;
pub mod output;
pub mod session;

use config::{CONFIG_PATH, Config};
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::info;

/// Files whose presence marks the root of a web project
const ROOT_MARKERS: &[&str] = &["package.json", ".config/baseline", ".git"];

/// Walk up from the current directory to the nearest project root.
///
/// Falls back to the current directory when no marker is found.
pub fn find_project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().wrap_err("Failed to get current directory")?;
    Ok(find_project_root_from(&cwd))
}

pub fn find_project_root_from(start: &Path) -> PathBuf {
    let mut current = start.to_path_buf();
    loop {
        if ROOT_MARKERS.iter().any(|m| current.join(m).exists()) {
            return current;
        }
        if !current.pop() {
            return start.to_path_buf();
        }
    }
}

/// Default config path for a project root
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_PATH)
}

/// Load a config file, failing if it is missing or malformed.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

    Config::from_yaml(&content)
        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load config if it exists, otherwise return the default config.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    load_config(path)
}

//! Configuration module
//!
//! Handles loading settings from YAML/JSON files and environment variables.
//! Settings are passed around explicitly; there is no process-wide instance.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Environment variable pointing at a settings file
pub const SETTINGS_PATH_ENV: &str = "HARVESTER_SETTINGS_PATH";

/// Load settings from the first file found, falling back to defaults.
///
/// Lookup order: `HARVESTER_SETTINGS_PATH`, `harvester.yml`,
/// `config/harvester.yml`, `config.json`, then the per-user config
/// directory. Environment overrides are merged last in every case.
pub fn load() -> Result<Settings> {
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    for path in search_paths() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("harvester.yml"),
        PathBuf::from("config/harvester.yml"),
        PathBuf::from("config.json"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("searx-harvester/settings.yml"));
    }
    paths
}

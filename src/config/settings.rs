//! Generator settings loaded from `proxygen.toml`
//!
//! The settings file sits alongside the proxy configuration document and
//! tunes publication and validation without touching the configuration itself.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::reconcile::EntryLimits;

/// File name looked up next to the configuration document.
pub const SETTINGS_FILE_NAME: &str = "proxygen.toml";

/// Publication knobs read by [`publish_bundle`](crate::publish::publish_bundle).
///
/// The CLI never publishes, so these only take effect for library callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    /// Files per push request
    pub batch_size: usize,
    /// Branch the bundle is pushed to
    pub branch: String,
    /// Commit message for every pushed batch
    pub commit_message: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        PublishSettings {
            batch_size: 100,
            branch: "main".to_string(),
            commit_message: "Update generated proxy bundle".to_string(),
        }
    }
}

/// Contents of `proxygen.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub publish: PublishSettings,
    /// Limits applied to every secret map before sync or generation
    pub limits: EntryLimits,
    /// Carry secret-map entries across a rename instead of dropping them
    pub migrate_secret_maps_on_rename: bool,
}

/// Load settings from a TOML file.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but
/// fails to parse.
pub fn load_settings(settings_path: &Path) -> anyhow::Result<Option<GeneratorSettings>> {
    if !settings_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(settings_path)
        .with_context(|| format!("Failed to read settings: {}", settings_path.display()))?;

    let settings: GeneratorSettings = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse settings: {}", settings_path.display()))?;

    Ok(Some(settings))
}

/// Look for `proxygen.toml` in the directory of the configuration document.
pub fn auto_detect_settings_path(config_path: &Path) -> Option<PathBuf> {
    let dir = config_path.parent()?;
    let candidate = if dir.as_os_str().is_empty() {
        PathBuf::from(SETTINGS_FILE_NAME)
    } else {
        dir.join(SETTINGS_FILE_NAME)
    };
    candidate.exists().then_some(candidate)
}

/// Resolve and load settings.
///
/// Priority:
/// 1. Explicitly provided path (must exist)
/// 2. Auto-detected alongside the configuration document
/// 3. Defaults
pub fn resolve_settings(
    explicit_path: Option<&Path>,
    config_path: &Path,
) -> anyhow::Result<GeneratorSettings> {
    if let Some(path) = explicit_path {
        return load_settings(path)?
            .with_context(|| format!("Settings file not found: {}", path.display()));
    }
    match auto_detect_settings_path(config_path) {
        Some(path) => Ok(load_settings(&path)?.unwrap_or_default()),
        None => Ok(GeneratorSettings::default()),
    }
}

use anyhow::Context;
use std::path::Path;
use tracing::debug;

use crate::environment::ProxyConfiguration;

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false)
}

/// Read a configuration document, YAML or JSON by extension.
pub fn load_configuration(path: &Path) -> anyhow::Result<ProxyConfiguration> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
    let config: ProxyConfiguration = if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML configuration: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON configuration: {}", path.display()))?
    };
    debug!(
        path = %path.display(),
        environments = config.environments.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Write a configuration document, YAML or JSON by extension.
pub fn save_configuration(config: &ProxyConfiguration, path: &Path) -> anyhow::Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(config).context("Failed to serialize configuration as YAML")?
    } else {
        let mut json =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration as JSON")?;
        json.push('\n');
        json
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for {}", path.display()))?;
        }
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write configuration: {}", path.display()))?;
    Ok(())
}

use std::path::{Path, PathBuf};

use crate::error::InkpadError;

use super::env::expand_config;
use super::inkpad_home;
use super::types::{ConfigFile, InkpadConfig};

/// Discover config files in precedence order (highest first).
///
/// 1. `--config` CLI flag
/// 2. `INKPAD_CONFIG` env var
/// 3. `./config/inkpad.json` (project-level)
/// 4. `<home>/inkpad.json`, home being `INKPAD_HOME` or `~/.inkpad`
///
/// Paths that do not exist are skipped.
pub fn discover_config_files(cli_config: Option<&str>) -> Vec<PathBuf> {
    let candidates = [
        cli_config.map(PathBuf::from),
        std::env::var("INKPAD_CONFIG").ok().map(PathBuf::from),
        Some(PathBuf::from("./config/inkpad.json")),
        Some(inkpad_home().join("inkpad.json")),
    ];

    let mut files: Vec<PathBuf> = Vec::new();
    for path in candidates.into_iter().flatten() {
        if path.exists() && !files.contains(&path) {
            files.push(path);
        }
    }
    files
}

fn load_config_file(path: &Path) -> Result<ConfigFile, InkpadError> {
    let content = std::fs::read_to_string(path).map_err(|e| InkpadError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Cannot read file: {e}"),
    })?;
    serde_json::from_str(&content).map_err(|e| InkpadError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Invalid JSON: {e}"),
    })
}

/// Merge the given files (highest precedence first), apply the base URL
/// override, fill defaults and expand environment variables.
pub fn load_config_from(
    files: &[PathBuf],
    base_url_override: Option<String>,
) -> Result<InkpadConfig, InkpadError> {
    let mut merged = ConfigFile::default();
    for path in files {
        let file = load_config_file(path)?;
        tracing::debug!("Loaded config from {}", path.display());
        merged.merge_from(file);
    }
    if let Some(url) = base_url_override.filter(|u| !u.is_empty()) {
        merged.base_url = Some(url);
    }

    let mut config = InkpadConfig::from(merged);
    config.sources = files.to_vec();
    expand_config(&mut config)?;
    Ok(config)
}

/// Load, merge and expand all configuration.
pub fn load_config(cli_config: Option<&str>) -> Result<InkpadConfig, InkpadError> {
    let files = discover_config_files(cli_config);
    load_config_from(&files, std::env::var("INKPAD_BASE_URL").ok())
}

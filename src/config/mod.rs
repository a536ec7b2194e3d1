pub mod env;
pub mod loader;
pub mod types;

use std::path::PathBuf;

pub use loader::{load_config, load_config_from};
pub use types::{AuthConfig, ConfigFile, InkpadConfig};

/// Directory holding the home config and the credential file:
/// `INKPAD_HOME` if set, otherwise `~/.inkpad`.
pub fn inkpad_home() -> PathBuf {
    if let Some(home) = std::env::var_os("INKPAD_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".inkpad")
}

pub fn credentials_path() -> PathBuf {
    inkpad_home().join("credentials.json")
}

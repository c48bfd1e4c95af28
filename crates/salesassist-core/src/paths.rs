//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the SalesAssist base directory (~/.salesassist).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".salesassist"))
}

/// Get the REPL history file path (~/.salesassist/history).
pub fn history_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("history"))
}

/// Get the gcloud application default credentials file.
///
/// `%APPDATA%\gcloud\...` on Windows, `~/.config/gcloud/...` elsewhere.
pub fn gcloud_adc_file() -> Option<PathBuf> {
    let config_root = if cfg!(windows) {
        dirs::config_dir()
    } else {
        dirs::home_dir().map(|h| h.join(".config"))
    };
    config_root.map(|d| d.join("gcloud").join("application_default_credentials.json"))
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

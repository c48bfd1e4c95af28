//! Environment variable handling.

use std::env;
use std::path::Path;
use tracing::debug;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
pub fn get_var_or(name: &str, default: &str) -> String {
    get_var(name).unwrap_or_else(|| default.to_string())
}

/// Interpret a raw flag value as a boolean.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name).map(|v| parse_bool(&v)).unwrap_or(false)
}

/// Load environment variables from `.env` in the working directory.
pub fn load_dotenv() -> Result<(), std::io::Error> {
    load_dotenv_from(Path::new(".env"))
}

/// Load environment variables from a dotenv-style file.
///
/// Variables that are already set in the process environment win.
pub fn load_dotenv_from(path: &Path) -> Result<(), std::io::Error> {
    if !path.exists() {
        return Ok(());
    }

    let content = std::fs::read_to_string(path)?;
    let mut loaded = 0;
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            env::set_var(key, value);
            loaded += 1;
        }
    }
    debug!("Loaded {} variables from {}", loaded, path.display());
    Ok(())
}

/// Parse `KEY=value` lines, skipping comments and blank lines.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();

            // Remove quotes if present
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);

            if !key.is_empty() {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
    }

    pairs
}

/// Environment variable names read by SalesAssist.
pub mod vars {
    /// Google Cloud project hosting the warehouse and the model.
    pub const GOOGLE_CLOUD_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";

    /// Google Cloud region for Vertex AI.
    pub const GOOGLE_CLOUD_LOCATION: &str = "GOOGLE_CLOUD_LOCATION";

    /// Fully qualified default table (`project.dataset.table`).
    pub const BIGQUERY_TABLE_ID: &str = "BIGQUERY_TABLE_ID";

    /// BigQuery job location.
    pub const BIGQUERY_LOCATION: &str = "BIGQUERY_LOCATION";

    /// Language model identifier.
    pub const MODEL: &str = "MODEL";

    /// Vertex AI Agent Engine (reasoning engine) identifier.
    pub const AGENT_ENGINE_ID: &str = "AGENT_ENGINE_ID";

    /// Use the Agent Engine memory bank.
    pub const USE_AGENT_ENGINE_MEMORY: &str = "USE_AGENT_ENGINE_MEMORY";

    /// Use Agent Engine sessions.
    pub const USE_AGENT_ENGINE_SESSION: &str = "USE_AGENT_ENGINE_SESSION";

    /// Session-state key carrying a delegated OAuth token.
    pub const GEMINI_ENTERPRISE_AUTH_ID: &str = "GEMINI_ENTERPRISE_AUTH_ID";

    /// Path to a credentials file for application default credentials.
    pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

    /// Metadata server host override.
    pub const GCE_METADATA_HOST: &str = "GCE_METADATA_HOST";
}

//! Configuration loading from the environment.

use super::{Config, DEFAULT_MODEL};
use crate::env::{self, vars};
use crate::error::ConfigError;

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first; variables
    /// already set in the environment take precedence.
    pub fn from_env() -> Result<Self, ConfigError> {
        env::load_dotenv()?;
        Self::from_lookup(env::get_var)
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Every missing required variable is
    /// reported, not just the first one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |name: &str| {
            let value = get(name);
            if value.is_none() {
                missing.push(name.to_string());
            }
            value.unwrap_or_default()
        };

        let project_id = required(vars::GOOGLE_CLOUD_PROJECT);
        let location = required(vars::GOOGLE_CLOUD_LOCATION);
        let bigquery_table_id = required(vars::BIGQUERY_TABLE_ID);

        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        let flag = |name: &str| get(name).map(|v| env::parse_bool(&v)).unwrap_or(false);

        Ok(Self {
            bigquery_location: get(vars::BIGQUERY_LOCATION).unwrap_or_else(|| location.clone()),
            model: get(vars::MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            agent_engine_id: get(vars::AGENT_ENGINE_ID),
            use_agent_engine_memory: flag(vars::USE_AGENT_ENGINE_MEMORY),
            use_agent_engine_session: flag(vars::USE_AGENT_ENGINE_SESSION),
            enterprise_auth_id: get(vars::GEMINI_ENTERPRISE_AUTH_ID),
            project_id,
            location,
            bigquery_table_id,
        })
    }
}

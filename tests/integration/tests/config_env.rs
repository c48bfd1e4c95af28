//! Configuration loaded from `.env` content.

use salesassist_core::env::parse_dotenv;
use salesassist_core::{Backend, Config, ConfigError};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn load(contents: &str) -> Result<Config, ConfigError> {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();

    let text = std::fs::read_to_string(file.path()).unwrap();
    let vars: HashMap<String, String> = parse_dotenv(&text).into_iter().collect();
    Config::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn test_dotenv_with_agent_engine() {
    let config = load(
        "# deployed agent\n\
         GOOGLE_CLOUD_PROJECT=acme-sales\n\
         GOOGLE_CLOUD_LOCATION=us-central1\n\
         BIGQUERY_TABLE_ID=acme-sales.sales.transactions\n\
         AGENT_ENGINE_ID=1234567890\n\
         USE_AGENT_ENGINE_MEMORY=true\n\
         USE_AGENT_ENGINE_SESSION=false\n",
    )
    .unwrap();

    assert_eq!(config.bigquery_location, "us-central1");
    assert_eq!(config.default_dataset_id(), "acme-sales.sales");
    assert_eq!(
        config.memory_backend(),
        Backend::Remote {
            engine_id: "1234567890".to_string()
        }
    );
    assert_eq!(config.session_backend(), Backend::Local);
}

#[test]
fn test_missing_variables_are_all_reported() {
    let err = load("GOOGLE_CLOUD_LOCATION=us-central1\n").unwrap_err();
    match err {
        ConfigError::MissingVars(names) => {
            assert_eq!(names, vec!["GOOGLE_CLOUD_PROJECT", "BIGQUERY_TABLE_ID"]);
        }
        other => panic!("Expected MissingVars, got {:?}", other),
    }
}

#[test]
fn test_serialized_config_round_trips() {
    let config = load(
        "GOOGLE_CLOUD_PROJECT=acme-sales\n\
         GOOGLE_CLOUD_LOCATION=europe-west1\n\
         BIGQUERY_TABLE_ID=sales.transactions\n\
         BIGQUERY_LOCATION=EU\n\
         MODEL=gemini-1.5-pro\n",
    )
    .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
    assert_eq!(parsed.bigquery_location, "EU");
    assert_eq!(parsed.model, "gemini-1.5-pro");
}

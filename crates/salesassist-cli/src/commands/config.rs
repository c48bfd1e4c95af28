//! Configuration display.

use super::load_config;
use serde_json::Value;

/// Print the resolved configuration and the backends it selects.
pub fn run() -> anyhow::Result<()> {
    let config = load_config()?;

    let mut json = serde_json::to_value(&config)?;
    if let Value::Object(map) = &mut json {
        map.insert(
            "default_dataset_id".to_string(),
            Value::from(config.default_dataset_id()),
        );
        map.insert(
            "session_backend".to_string(),
            Value::from(config.session_backend().to_string()),
        );
        map.insert(
            "memory_backend".to_string(),
            Value::from(config.memory_backend().to_string()),
        );
    }

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

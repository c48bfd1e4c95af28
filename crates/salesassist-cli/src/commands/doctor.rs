//! Diagnostic commands.

use console::{style, Emoji};
use salesassist_agent::CredentialResolver;
use salesassist_cloud::{BigQueryConnector, Credentials};
use salesassist_core::{paths, Config};
use std::sync::Arc;

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Run the doctor command.
pub async fn run() -> anyhow::Result<()> {
    println!("SalesAssist Doctor\n");

    let mut errors = 0;
    let mut warnings = 0;

    println!("Checking configuration...");

    let config = match Config::from_env() {
        Ok(config) => {
            println!("  {} Configuration loaded", style(CHECK).green());
            println!("    project:  {}", config.project_id);
            println!("    location: {}", config.location);
            println!("    table:    {}", config.bigquery_table_id);
            println!("    model:    {}", config.model);
            Some(config)
        }
        Err(e) => {
            println!("  {} Configuration invalid: {}", style(CROSS).red(), e);
            errors += 1;
            None
        }
    };

    if let Some(config) = &config {
        println!("\nChecking backends...");

        for (label, enabled, backend) in [
            ("Sessions", config.use_agent_engine_session, config.session_backend()),
            ("Memory", config.use_agent_engine_memory, config.memory_backend()),
        ] {
            if enabled && !backend.is_remote() {
                println!(
                    "  {} {} requested Agent Engine but AGENT_ENGINE_ID is not set; using {}",
                    style(WARN).yellow(),
                    label,
                    backend
                );
                warnings += 1;
            } else {
                println!("  {} {}: {}", style(CHECK).green(), label, backend);
            }
        }
    }

    println!("\nChecking credentials...");

    let http = reqwest::Client::new();
    let adc_ok = match Credentials::application_default(&http).await {
        Ok(credentials) => match credentials.access_token().await {
            Ok(_) => {
                println!(
                    "  {} Application default credentials ({:?})",
                    style(CHECK).green(),
                    credentials.kind()
                );
                true
            }
            Err(e) => {
                println!("  {} Token request failed: {}", style(CROSS).red(), e);
                errors += 1;
                false
            }
        },
        Err(e) => {
            println!("  {} No application default credentials: {}", style(CROSS).red(), e);
            if let Some(file) = paths::gcloud_adc_file() {
                println!("    Run 'gcloud auth application-default login' to create {:?}", file);
            }
            errors += 1;
            false
        }
    };

    if let (Some(config), true) = (&config, adc_ok) {
        println!("\nChecking BigQuery...");

        let resolver = CredentialResolver::new(config, Arc::new(BigQueryConnector::new(http)));
        let schema = match resolver.resolve(None).await {
            Ok(authorized) => authorized.client.get_table(&config.bigquery_table_id).await,
            Err(e) => Err(e),
        };

        match schema {
            Ok(schema) => {
                println!(
                    "  {} {} has {} columns",
                    style(CHECK).green(),
                    config.bigquery_table_id,
                    schema.fields.len()
                );
            }
            Err(e) => {
                println!(
                    "  {} Cannot read {}: {}",
                    style(CROSS).red(),
                    config.bigquery_table_id,
                    e
                );
                errors += 1;
            }
        }
    }

    println!("\n{}", style("Summary").bold());
    println!("  Errors: {}", if errors > 0 { style(errors).red() } else { style(errors).green() });
    println!("  Warnings: {}", if warnings > 0 { style(warnings).yellow() } else { style(warnings).green() });

    if errors > 0 {
        anyhow::bail!("{} error(s) found", errors);
    }

    Ok(())
}

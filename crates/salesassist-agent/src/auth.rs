//! Credential resolution for warehouse calls.
//!
//! Every tool call gets a fresh client. When the conversation carries a
//! delegated OAuth token under the configured auth id, that exact token is
//! used; otherwise the process falls back to application default credentials.

use crate::tools::ToolContext;
use salesassist_cloud::{ClientScope, Result, WarehouseClient, WarehouseConnector};
use salesassist_core::Config;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Which identity an [`AuthorizedClient`] acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// A bearer token delegated through the conversation state.
    Delegated,

    /// The identity of the running process.
    ApplicationDefault,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delegated => write!(f, "delegated token"),
            Self::ApplicationDefault => write!(f, "application default credentials"),
        }
    }
}

/// A warehouse client bound to one credential source for its whole lifetime.
pub struct AuthorizedClient {
    pub source: CredentialSource,
    pub scope: ClientScope,
    pub client: Arc<dyn WarehouseClient>,
}

impl fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("source", &self.source)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Chooses the credential path for each warehouse call.
pub struct CredentialResolver {
    connector: Arc<dyn WarehouseConnector>,
    project_id: String,
    location: String,
    auth_id: Option<String>,
}

impl CredentialResolver {
    /// Create a resolver scoped to the configured project and BigQuery location.
    pub fn new(config: &Config, connector: Arc<dyn WarehouseConnector>) -> Self {
        Self {
            connector,
            project_id: config.project_id.clone(),
            location: config.bigquery_location.clone(),
            auth_id: config.enterprise_auth_id.clone(),
        }
    }

    /// Scope every resolved client is bound to.
    pub fn scope(&self) -> ClientScope {
        ClientScope::new(&self.project_id, &self.location)
    }

    /// The delegated token carried by `context`, if any.
    pub fn delegated_token<'a>(&self, context: Option<&'a ToolContext>) -> Option<&'a str> {
        let key = self.auth_id.as_deref().filter(|k| !k.is_empty())?;
        context?.state_str(key)
    }

    /// Build a client for one call.
    pub async fn resolve(&self, context: Option<&ToolContext>) -> Result<AuthorizedClient> {
        let scope = self.scope();

        let (source, client) = match self.delegated_token(context) {
            Some(token) => {
                info!(
                    "Using delegated token for BigQuery ({}/{})",
                    scope.project_id, scope.location
                );
                let client = self.connector.with_token(token, scope.clone()).await?;
                (CredentialSource::Delegated, client)
            }
            None => {
                info!(
                    "Using application default credentials for BigQuery ({}/{})",
                    scope.project_id, scope.location
                );
                let client = self.connector.with_default_credentials(scope.clone()).await?;
                (CredentialSource::ApplicationDefault, client)
            }
        };

        Ok(AuthorizedClient {
            source,
            scope,
            client,
        })
    }
}

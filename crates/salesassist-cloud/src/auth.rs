//! Google OAuth2 credentials.
//!
//! Two shapes exist: a fixed bearer token handed to us by a caller (delegated
//! identity), and application default credentials discovered from the
//! environment, which mint and refresh their own access tokens.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use salesassist_core::env::{self, vars};
use salesassist_core::{paths, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// OAuth scope requested for every minted token.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Default OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Default metadata server host.
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before they expire.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Where a credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// A caller-supplied access token.
    Bearer,

    /// A gcloud user login (`authorized_user` file).
    AuthorizedUser,

    /// A service account key file.
    ServiceAccount,

    /// The GCE / Cloud Run metadata server.
    MetadataServer,
}

/// OAuth2 credentials for Google APIs.
///
/// Cheap to clone; clones share one token cache.
#[derive(Clone)]
pub struct Credentials {
    inner: Arc<Inner>,
}

enum Inner {
    Bearer(SecretString),
    Refreshing {
        source: TokenSource,
        http: Client,
        cache: Mutex<Option<CachedToken>>,
    },
}

enum TokenSource {
    AuthorizedUser(AuthorizedUserKey),
    ServiceAccount(ServiceAccountKey),
    MetadataServer { host: String },
}

struct CachedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

/// Contents of an `authorized_user` credentials file.
#[derive(Deserialize)]
struct AuthorizedUserKey {
    client_id: String,
    client_secret: SecretString,
    refresh_token: SecretString,
    #[serde(default)]
    token_uri: Option<String>,
}

/// Contents of a `service_account` key file.
#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: SecretString,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Deserialize)]
struct CredentialsFile {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: SecretString,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl Credentials {
    /// Credentials that always present the given access token.
    pub fn from_token(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(CloudError::auth("Access token is empty"));
        }
        Ok(Self {
            inner: Arc::new(Inner::Bearer(SecretString::new(token))),
        })
    }

    /// Discover application default credentials.
    ///
    /// Order: `GOOGLE_APPLICATION_CREDENTIALS`, the gcloud well-known file,
    /// then the metadata server.
    pub async fn application_default(http: &Client) -> Result<Self> {
        if let Some(path) = env::get_var(vars::GOOGLE_APPLICATION_CREDENTIALS) {
            debug!("Loading credentials from {}", path);
            return Self::from_file(http, Path::new(&path));
        }

        if let Some(path) = paths::gcloud_adc_file().filter(|p| p.exists()) {
            debug!("Loading gcloud credentials from {}", path.display());
            return Self::from_file(http, &path);
        }

        let host = env::get_var_or(vars::GCE_METADATA_HOST, DEFAULT_METADATA_HOST);
        if probe_metadata_server(http, &host).await {
            info!("Using metadata server credentials");
            return Ok(Self::metadata_server(http, host));
        }

        Err(CloudError::auth(
            "Could not find application default credentials. Run `gcloud auth application-default login` or set GOOGLE_APPLICATION_CREDENTIALS",
        ))
    }

    /// Load credentials from a JSON key file.
    pub fn from_file(http: &Client, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CloudError::auth(format!("Cannot read credentials file {}: {}", path.display(), e))
        })?;
        Self::from_json(http, &content)
    }

    /// Parse an `authorized_user` or `service_account` JSON document.
    pub fn from_json(http: &Client, json: &str) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_str(json)?;
        let source = match file.kind.as_str() {
            "authorized_user" => TokenSource::AuthorizedUser(serde_json::from_str(json)?),
            "service_account" => TokenSource::ServiceAccount(serde_json::from_str(json)?),
            other => {
                return Err(CloudError::auth(format!(
                    "Unsupported credentials type: {}",
                    other
                )))
            }
        };
        Ok(Self::refreshing(http, source))
    }

    /// Credentials minted by the metadata server at `host`.
    pub fn metadata_server(http: &Client, host: impl Into<String>) -> Self {
        Self::refreshing(http, TokenSource::MetadataServer { host: host.into() })
    }

    fn refreshing(http: &Client, source: TokenSource) -> Self {
        Self {
            inner: Arc::new(Inner::Refreshing {
                source,
                http: http.clone(),
                cache: Mutex::new(None),
            }),
        }
    }

    /// Where this credential came from.
    pub fn kind(&self) -> CredentialKind {
        match self.inner.as_ref() {
            Inner::Bearer(_) => CredentialKind::Bearer,
            Inner::Refreshing { source, .. } => match source {
                TokenSource::AuthorizedUser(_) => CredentialKind::AuthorizedUser,
                TokenSource::ServiceAccount(_) => CredentialKind::ServiceAccount,
                TokenSource::MetadataServer { .. } => CredentialKind::MetadataServer,
            },
        }
    }

    /// A valid access token, refreshed when close to expiry.
    pub async fn access_token(&self) -> Result<SecretString> {
        let (source, http, cache) = match self.inner.as_ref() {
            Inner::Bearer(token) => return Ok(token.clone()),
            Inner::Refreshing {
                source,
                http,
                cache,
            } => (source, http, cache),
        };

        let mut cached = cache.lock().await;
        if let Some(token) = cached.as_ref() {
            if Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let response = source.fetch(http).await?;
        let token = response.access_token.clone();
        *cached = Some(CachedToken {
            token: response.access_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
        });
        Ok(token)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("kind", &self.kind())
            .finish()
    }
}

impl TokenSource {
    async fn fetch(&self, http: &Client) -> Result<TokenResponse> {
        let response = match self {
            Self::AuthorizedUser(key) => {
                let uri = key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
                debug!("Refreshing user access token");
                http.post(uri)
                    .form(&[
                        ("grant_type", "refresh_token"),
                        ("client_id", key.client_id.as_str()),
                        ("client_secret", key.client_secret.expose_secret()),
                        ("refresh_token", key.refresh_token.expose_secret()),
                    ])
                    .send()
                    .await?
            }
            Self::ServiceAccount(key) => {
                let uri = key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
                let assertion = key.sign_assertion(uri)?;
                debug!("Exchanging service account assertion for {}", key.client_email);
                http.post(uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
                    .send()
                    .await?
            }
            Self::MetadataServer { host } => {
                debug!("Requesting token from metadata server");
                http.get(format!(
                    "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
                    host
                ))
                .header("Metadata-Flavor", "Google")
                .send()
                .await?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::auth(format!(
                "Token request failed with HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        Ok(response.json().await?)
    }
}

impl ServiceAccountKey {
    fn sign_assertion(&self, audience: &str) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &self.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: audience,
            iat,
            exp: iat + 3600,
        };

        let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = jsonwebtoken::EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())?;
        Ok(jsonwebtoken::encode(&header, &claims, &key)?)
    }
}

async fn probe_metadata_server(http: &Client, host: &str) -> bool {
    let result = http
        .get(format!("http://{}/", host))
        .header("Metadata-Flavor", "Google")
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await;

    match result {
        Ok(response) => response
            .headers()
            .get("Metadata-Flavor")
            .map(|v| v == "Google")
            .unwrap_or(false),
        Err(e) => {
            debug!("Metadata server not reachable: {}", e);
            false
        }
    }
}

//! Authorized JSON requests against Google REST APIs.

use crate::auth::Credentials;
use crate::error::{CloudError, Result};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Attach a bearer token from `credentials`.
pub(crate) async fn authorize(
    request: RequestBuilder,
    credentials: &Credentials,
) -> Result<RequestBuilder> {
    let token = credentials.access_token().await?;
    Ok(request.bearer_auth(token.expose_secret()))
}

/// Send an authorized request and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    credentials: &Credentials,
) -> Result<T> {
    let response = send(request, credentials).await?;
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Send an authorized request, mapping non-success statuses to errors.
pub(crate) async fn send(request: RequestBuilder, credentials: &Credentials) -> Result<Response> {
    let request = authorize(request, credentials).await?;
    let response = request.send().await?;
    debug!("{} {}", response.status().as_u16(), response.url().path());
    check(response).await
}

/// Map a non-success response into a [`CloudError`].
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let err = CloudError::from_status(status.as_u16(), &body);
    warn!("Request failed: {}", err);
    Err(err)
}

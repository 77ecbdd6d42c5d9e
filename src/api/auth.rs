//! OAuth token acquisition.
//!
//! PrivX issues bearer tokens from `/auth/api/v1/oauth/token` using the
//! resource-owner password grant; the OAuth client itself authenticates with
//! HTTP basic auth.

use serde::Deserialize;

use super::{Request, Service, endpoint_url};
use crate::config::{Credentials, Settings};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

fn token_request() -> Request {
    Request::post(Service::Auth, "/oauth/token")
}

/// Return a bearer token for the resolved credentials.
///
/// A pre-issued token (`Credentials::Bearer`) is returned without any network
/// round trip.
pub async fn access_token(
    client: &reqwest::Client,
    settings: &Settings,
) -> Result<String, ApiError> {
    match &settings.credentials {
        Credentials::Bearer(token) => {
            tracing::debug!("using pre-issued bearer token");
            Ok(token.clone())
        }
        Credentials::Password { access, secret } => {
            password_grant(client, settings, access, secret).await
        }
    }
}

async fn password_grant(
    client: &reqwest::Client,
    settings: &Settings,
    access: &str,
    secret: &str,
) -> Result<String, ApiError> {
    let url = endpoint_url(&settings.base_url, &token_request())?;
    tracing::info!(url = %url, client_id = %settings.oauth_client_id, "requesting access token");

    let resp = client
        .post(url)
        .basic_auth(
            &settings.oauth_client_id,
            Some(&settings.oauth_client_secret),
        )
        .form(&[
            ("grant_type", "password"),
            ("username", access),
            ("password", secret),
        ])
        .send()
        .await?;

    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        let err = ApiError::from_body(status.as_u16(), &body);
        return Err(ApiError::Auth(err.to_string()));
    }

    let token: TokenResponse = serde_json::from_slice(&body)?;
    if token.access_token.is_empty() {
        return Err(ApiError::Auth("token endpoint returned an empty access token".to_string()));
    }
    tracing::debug!(
        token_type = token.token_type.as_deref().unwrap_or("bearer"),
        expires_in = token.expires_in.unwrap_or(0),
        "access token issued"
    );
    Ok(token.access_token)
}

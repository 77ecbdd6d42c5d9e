//! `reqwest` backed connector.

use std::time::Duration;

use tokio::sync::OnceCell;
use url::Url;

use super::{Connector, Method, Request, auth, endpoint_url};
use crate::config::Settings;
use crate::error::ApiError;

const TIMEOUT: Duration = Duration::from_secs(60);

/// Authenticated HTTP connector, built once per invocation.
///
/// The access token is requested on the first call, so commands that fail
/// their own checks never reach the token endpoint.
pub struct HttpConnector {
    client: reqwest::Client,
    settings: Settings,
    token: OnceCell<String>,
}

impl HttpConnector {
    pub fn new(settings: Settings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!("privx-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpConnector {
            client,
            settings,
            token: OnceCell::new(),
        })
    }

    fn base_url(&self) -> &Url {
        &self.settings.base_url
    }

    async fn token(&self) -> Result<&str, ApiError> {
        let token = self
            .token
            .get_or_try_init(|| auth::access_token(&self.client, &self.settings))
            .await?;
        Ok(token.as_str())
    }
}

impl Connector for HttpConnector {
    async fn send(&self, request: Request) -> Result<Vec<u8>, ApiError> {
        let token = self.token().await?;
        let url = endpoint_url(self.base_url(), &request)?;
        tracing::debug!(method = %request.method, url = %url, "sending request");

        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        let builder = builder.bearer_auth(token);
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(ApiError::from_body(status.as_u16(), &body));
        }
        Ok(body.to_vec())
    }

    async fn access_token(&self) -> Result<Option<String>, ApiError> {
        self.token().await.map(|t| Some(t.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[test]
    fn building_the_connector_makes_no_request() {
        let settings = Settings {
            base_url: Url::parse("http://127.0.0.1:9").unwrap(),
            credentials: Credentials::Password {
                access: "x".into(),
                secret: "y".into(),
            },
            oauth_client_id: "privx-external".into(),
            oauth_client_secret: String::new(),
        };
        let api = HttpConnector::new(settings).unwrap();
        assert!(api.token.get().is_none());
    }

    #[tokio::test]
    async fn bearer_token_is_filled_on_first_use() {
        let settings = Settings {
            base_url: Url::parse("http://127.0.0.1:9").unwrap(),
            credentials: Credentials::Bearer("tok".into()),
            oauth_client_id: "privx-external".into(),
            oauth_client_secret: String::new(),
        };
        let api = HttpConnector::new(settings).unwrap();
        assert_eq!(api.access_token().await.unwrap().as_deref(), Some("tok"));
        assert_eq!(api.token.get().map(String::as_str), Some("tok"));
    }
}

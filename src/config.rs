//! Connection settings.
//!
//! Values are resolved per field with precedence command line flag >
//! environment variable > config file. The flags already carry their
//! environment fallback through clap, so `resolve` only sees the merged flag
//! value plus the OAuth client variables which have no flag.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::api::parse_base_url;
use crate::error::ApiError;

pub const ENV_BASE_URL: &str = "PRIVX_API_BASE_URL";
pub const ENV_ACCESS_KEY: &str = "PRIVX_API_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "PRIVX_API_SECRET_KEY";
pub const ENV_OAUTH_CLIENT_ID: &str = "PRIVX_API_OAUTH_CLIENT_ID";
pub const ENV_OAUTH_CLIENT_SECRET: &str = "PRIVX_API_OAUTH_CLIENT_SECRET";

const DEFAULT_CONFIG_FILE: &str = "privx-sdk.toml";
const DEFAULT_OAUTH_CLIENT_ID: &str = "privx-external";

/* ---- Config file ---- */

/// On-disk layout of `privx-sdk.toml`.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct ApiSection {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct AuthSection {
    pub api_client_id: Option<String>,
    pub api_client_secret: Option<String>,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
}

impl FileConfig {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        toml::from_str(raw).map_err(|e| ApiError::Config(format!("failed to parse config: {e}")))
    }

    /// Load the config file.
    ///
    /// An explicit path must exist and parse. Without one, the default file in
    /// the home directory is used when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApiError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match default_path() {
                Some(p) if p.is_file() => p,
                _ => return Ok(Self::default()),
            },
        };
        tracing::debug!(path = %path.display(), "loading config file");
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            ApiError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(DEFAULT_CONFIG_FILE))
}

/* ---- Resolved settings ---- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// API client keys or username/password, exchanged for a token.
    Password { access: String, secret: String },
    /// A token issued earlier, e.g. by `privx-cli login`.
    Bearer(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub credentials: Credentials,
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
}

/// Values given on the command line (or their environment fallback).
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub url: Option<String>,
    pub access: Option<String>,
    pub secret: Option<String>,
}

fn first(candidates: [Option<String>; 3]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Merge flags, environment and config file into `Settings`.
///
/// `env` looks up environment variables; it is a parameter so tests do not
/// touch the process environment.
pub fn resolve(
    flags: &Overrides,
    env: impl Fn(&str) -> Option<String>,
    file: FileConfig,
) -> Result<Settings, ApiError> {
    let FileConfig { api, auth } = file;

    let base = first([flags.url.clone(), env(ENV_BASE_URL), api.base_url]).ok_or_else(|| {
        ApiError::Config(format!("PrivX url is not defined (use --url or {ENV_BASE_URL})"))
    })?;
    let base_url = parse_base_url(&base)?;

    let access = first([flags.access.clone(), env(ENV_ACCESS_KEY), auth.api_client_id]);
    let secret = first([flags.secret.clone(), env(ENV_SECRET_KEY), auth.api_client_secret]);

    let credentials = match (access, secret) {
        (Some(access), Some(secret)) => Credentials::Password { access, secret },
        (None, Some(token)) => Credentials::Bearer(token),
        (Some(_), None) => {
            return Err(ApiError::Config(format!(
                "secret key is not defined (use --secret or {ENV_SECRET_KEY})"
            )));
        }
        (None, None) => {
            return Err(ApiError::Config(format!(
                "access credentials are not defined (use --access/--secret or {ENV_ACCESS_KEY}/{ENV_SECRET_KEY})"
            )));
        }
    };

    let oauth_client_id = first([None, env(ENV_OAUTH_CLIENT_ID), auth.oauth_client_id])
        .unwrap_or_else(|| DEFAULT_OAUTH_CLIENT_ID.to_string());
    let oauth_client_secret =
        first([None, env(ENV_OAUTH_CLIENT_SECRET), auth.oauth_client_secret]).unwrap_or_default();

    Ok(Settings {
        base_url,
        credentials,
        oauth_client_id,
        oauth_client_secret,
    })
}

//! Errors raised while talking to the PrivX REST API.
//!
//! Command handlers work with `anyhow::Result` and wrap these with context;
//! the connector layer returns `ApiError` so tests can match on the variant.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid url")]
    Url(#[from] url::ParseError),

    #[error("http request failed")]
    Http(#[from] reqwest::Error),

    #[error("invalid json")]
    Json(#[from] serde_json::Error),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Build a `Status` error from a response body.
    ///
    /// PrivX services report failures as `{"error_code": ..., "error_message": ...}`;
    /// other bodies are kept verbatim (trimmed), and an empty body falls back to
    /// the canonical reason phrase.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body).trim().to_string();
        let parsed = serde_json::from_slice::<serde_json::Value>(body).ok();
        let from_json = parsed.as_ref().and_then(|v| {
            let code = v.get("error_code").and_then(|c| c.as_str());
            let msg = v.get("error_message").and_then(|m| m.as_str());
            match (code, msg) {
                (Some(c), Some(m)) => Some(format!("{c}: {m}")),
                (None, Some(m)) => Some(m.to_string()),
                (Some(c), None) => Some(c.to_string()),
                (None, None) => None,
            }
        });
        let message = match from_json {
            Some(m) => m,
            None if !text.is_empty() => text,
            None => reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unknown error")
                .to_string(),
        };
        ApiError::Status { status, message }
    }
}

/// Capitalise the first character of an error message for display.
pub fn capitalize_first(msg: &str) -> String {
    let mut chars = msg.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_prefers_privx_error_fields() {
        let body = br#"{"error_code":"NOT_FOUND","error_message":"host not found"}"#;
        let err = ApiError::from_body(404, body);
        assert_eq!(
            err.to_string(),
            "request failed with status 404: NOT_FOUND: host not found"
        );
    }

    #[test]
    fn status_message_falls_back_to_body_then_reason() {
        let err = ApiError::from_body(500, b"  boom \n");
        assert!(matches!(err, ApiError::Status { status: 500, ref message } if message == "boom"));

        let err = ApiError::from_body(403, b"");
        assert!(matches!(err, ApiError::Status { ref message, .. } if message == "Forbidden"));
    }

    #[test]
    fn wrapped_causes_are_printed_once() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let cause_text = cause.to_string();
        let err = anyhow::Error::new(ApiError::from(cause));
        let shown = format!("{err:#}");
        assert_eq!(shown, format!("invalid json: {cause_text}"));
        assert_eq!(shown.matches(cause_text.as_str()).count(), 1);
    }

    #[test]
    fn capitalize_first_handles_edge_cases() {
        assert_eq!(capitalize_first("ca type does not exist"), "Ca type does not exist");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("404 oops"), "404 oops");
        assert_eq!(capitalize_first("émoji"), "Émoji");
    }
}

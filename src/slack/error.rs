//! Mapping of Web API failures onto [`DirectoryError`]
//!
//! Three sources feed this: HTTP status codes, reqwest transport errors and
//! the `{"ok": false, "error": "<code>"}` envelope the API returns with a 200.

use crate::core::DirectoryError;

impl DirectoryError {
    /// Convert HTTP status code and body text into a typed error
    pub fn from_http_status(
        status: reqwest::StatusCode,
        body: String,
        retry_after_secs: Option<u64>,
    ) -> Self {
        match status.as_u16() {
            401 => DirectoryError::Unauthorized(body),
            403 => DirectoryError::MissingScope(body),
            404 => DirectoryError::NotFound(body),
            429 => DirectoryError::RateLimited { retry_after_secs },
            code => DirectoryError::Http { status: code, body },
        }
    }

    /// Convert network/connection errors into a typed error
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DirectoryError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            DirectoryError::Network(format!("Connection failed: {}", e))
        } else if let Some(status) = e.status() {
            Self::from_http_status(status, e.to_string(), None)
        } else if e.is_decode() {
            DirectoryError::Decode(e.to_string())
        } else {
            DirectoryError::Network(e.to_string())
        }
    }

    /// Convert an API-level error code into a typed error
    pub fn from_api_code(method: &str, code: &str, retry_after_secs: Option<u64>) -> Self {
        match code {
            "invalid_auth" | "not_authed" | "token_revoked" | "token_expired"
            | "account_inactive" => DirectoryError::Unauthorized(code.to_string()),
            "missing_scope" | "not_allowed_token_type" | "no_permission" => {
                DirectoryError::MissingScope(code.to_string())
            }
            "ratelimited" => DirectoryError::RateLimited { retry_after_secs },
            c if c.ends_with("_not_found") => DirectoryError::NotFound(code.to_string()),
            _ => DirectoryError::Api {
                method: method.to_string(),
                code: code.to_string(),
            },
        }
    }
}

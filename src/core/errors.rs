//! Domain error types
//!
//! `DirectoryError` is what the remote directory reports; `CoreError` is what
//! the four core components hand back to the command layer. Both classify
//! themselves into a [`FailureKind`] by variant so callers never inspect
//! message strings.

use serde::Serialize;
use thiserror::Error;

/// Broad failure classes, each mapped to a process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing, invalid or revoked credentials
    Auth,
    /// Credentials valid but lacking a scope
    Permission,
    NotFound,
    RateLimited,
    /// Caller passed something unusable
    Invalid,
    General,
}

impl FailureKind {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::General | Self::Invalid => 1,
            Self::Auth => 2,
            Self::Permission => 3,
            Self::NotFound => 4,
            Self::RateLimited => 6,
        }
    }

    /// Next step worth suggesting to whoever reads the envelope
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Auth => Some("Run 'slka config init' or set SLKA_READ_TOKEN / SLKA_WRITE_TOKEN"),
            Self::Permission => Some("Add the missing OAuth scope to the app and reinstall it"),
            Self::NotFound => Some("Check the ID, name or email and try again"),
            Self::RateLimited => Some("Wait for the retry_after interval before retrying"),
            Self::Invalid | Self::General => None,
        }
    }
}

/// Failures reported by the remote directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Token missing, invalid, revoked or the account is inactive
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token lacks the scope the method needs
    #[error("Missing scope: {0}")]
    MissingScope(String),

    /// The platform reported the entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429 or `ratelimited`)
    #[error("Rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// `ok: false` with an error code not covered above
    #[error("{method} failed: {code}")]
    Api { method: String, code: String },

    /// Non-success HTTP status outside the known classes
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection refused, DNS, timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl DirectoryError {
    /// Transient failures the transport may retry
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }

    /// Short machine-readable code for the output envelope
    pub fn code(&self) -> String {
        match self {
            Self::Unauthorized(code) | Self::MissingScope(code) | Self::NotFound(code) => {
                code.clone()
            }
            Self::RateLimited { .. } => "ratelimited".to_string(),
            Self::Api { code, .. } => code.clone(),
            Self::Http { status, .. } => format!("http_{}", status),
            Self::Network(_) => "network_error".to_string(),
            Self::Decode(_) => "decode_error".to_string(),
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Unauthorized(_) => FailureKind::Auth,
            Self::MissingScope(_) => FailureKind::Permission,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Api { .. } | Self::Http { .. } | Self::Network(_) | Self::Decode(_) => {
                FailureKind::General
            }
        }
    }
}

/// Failures surfaced by the core components
#[derive(Debug, Error)]
pub enum CoreError {
    /// An identity or conversation lookup matched nothing
    #[error("Not found: {query}")]
    NotFound { query: String },

    /// The target message is gone or the timestamp is wrong
    #[error("Message {timestamp} not found in {conversation}")]
    MessageNotFound {
        conversation: String,
        timestamp: String,
    },

    /// A participant list resolved to nobody
    #[error("No participants given")]
    NoParticipants,

    /// The directory itself failed; propagated as reported
    #[error(transparent)]
    DirectoryUnavailable(#[from] DirectoryError),
}

impl CoreError {
    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    pub fn code(&self) -> String {
        match self {
            Self::NotFound { .. } => "not_found".to_string(),
            Self::MessageNotFound { .. } => "message_not_found".to_string(),
            Self::NoParticipants => "no_participants".to_string(),
            Self::DirectoryUnavailable(err) => err.code(),
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } | Self::MessageNotFound { .. } => FailureKind::NotFound,
            Self::NoParticipants => FailureKind::Invalid,
            Self::DirectoryUnavailable(err) => err.failure_kind(),
        }
    }
}

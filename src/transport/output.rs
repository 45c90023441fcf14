//! JSON envelope written to stdout, and exit codes

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::approval::WriteAction;
use crate::core::{CoreError, DirectoryError, FailureKind};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_APPROVAL_REQUIRED: i32 = 5;

/// One envelope per invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_approval: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
}

impl Envelope {
    pub fn to_json(&self, pretty: bool) -> String {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered.unwrap_or_else(|e| {
            format!(
                r#"{{"ok":false,"error":"encode_error","error_description":{:?}}}"#,
                e.to_string()
            )
        })
    }
}

/// A failed command, classified for the envelope and exit code
#[derive(Debug, Error)]
#[error("{code}: {description}")]
pub struct Failure {
    pub kind: FailureKind,
    pub code: String,
    pub description: String,
    pub suggestion: Option<String>,
    pub retry_after: Option<u64>,
}

impl Failure {
    pub fn new(kind: FailureKind, code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            description: description.into(),
            suggestion: kind.suggestion().map(str::to_string),
            retry_after: None,
        }
    }

    pub fn invalid(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(FailureKind::Invalid, code, description)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl From<DirectoryError> for Failure {
    fn from(err: DirectoryError) -> Self {
        let retry_after = err.retry_after();
        let mut failure = Self::new(err.failure_kind(), err.code(), err.to_string());
        failure.retry_after = retry_after;
        failure
    }
}

impl From<CoreError> for Failure {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DirectoryUnavailable(inner) => inner.into(),
            other => Self::new(other.failure_kind(), other.code(), other.to_string()),
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self::new(FailureKind::General, "error", format!("{:#}", err))
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Self::new(FailureKind::General, "io_error", err.to_string())
    }
}

/// What a command produced
#[derive(Debug)]
pub enum Outcome {
    Success(Value),
    DryRun(WriteAction),
    /// Denied at the prompt, or nobody could be asked
    ApprovalRequired(WriteAction),
}

impl Outcome {
    pub fn success(data: impl Serialize) -> Result<Self, Failure> {
        serde_json::to_value(data)
            .map(Self::Success)
            .map_err(|e| Failure::new(FailureKind::General, "encode_error", e.to_string()))
    }
}

/// Envelope and exit code for a finished command
pub fn render(result: Result<Outcome, Failure>) -> (Envelope, i32) {
    match result {
        Ok(Outcome::Success(data)) => (
            Envelope {
                ok: true,
                data: Some(data),
                ..Default::default()
            },
            EXIT_SUCCESS,
        ),
        Ok(Outcome::DryRun(action)) => (
            Envelope {
                dry_run: true,
                ..action_envelope(&action)
            },
            EXIT_SUCCESS,
        ),
        Ok(Outcome::ApprovalRequired(action)) => (
            Envelope {
                requires_approval: true,
                ..action_envelope(&action)
            },
            EXIT_APPROVAL_REQUIRED,
        ),
        Err(failure) => {
            let code = failure.exit_code();
            (
                Envelope {
                    ok: false,
                    error: Some(failure.code),
                    error_description: Some(failure.description),
                    suggestion: failure.suggestion,
                    retry_after: failure.retry_after,
                    ..Default::default()
                },
                code,
            )
        }
    }
}

fn action_envelope(action: &WriteAction) -> Envelope {
    Envelope {
        ok: false,
        action: Some(action.name().to_string()),
        description: Some(action.describe()),
        payload: Some(action.payload()),
        ..Default::default()
    }
}

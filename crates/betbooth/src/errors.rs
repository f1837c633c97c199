use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure categories surfaced at the action-dispatch boundary.
///
/// Every error a handler can hit is folded into one of these before it
/// reaches the transport; nothing propagates past the dispatcher as a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    Submission,
    ConfirmationTimeout,
    Read,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::Submission => "submission",
            Self::ConfirmationTimeout => "confirmation_timeout",
            Self::Read => "read",
        }
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("transaction submission failed: {0}")]
    Submission(String),

    #[error("timed out waiting for confirmation of {tx_hash}: {message}")]
    ConfirmationTimeout { tx_hash: String, message: String },

    #[error("contract read failed: {0}")]
    Read(String),
}

impl ActionError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Submission(_) => ErrorKind::Submission,
            Self::ConfirmationTimeout { .. } => ErrorKind::ConfirmationTimeout,
            Self::Read(_) => ErrorKind::Read,
        }
    }
}

/// Marker error used by the receipt poller so callers can tell an elapsed
/// deadline apart from other RPC failures.
#[derive(Debug, Error)]
#[error("no receipt after {seconds}s")]
pub struct ReceiptTimeout {
    pub seconds: u64,
}

/// Tagged outcome of one dispatched action.
///
/// Handlers keep the success/failure discriminant; the single reply string
/// the chat transport expects is only rendered at the transport edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReply {
    Success(String),
    Failure { kind: ErrorKind, message: String },
}

impl ActionReply {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Render to the single string the chat transport expects. Failures keep
    /// the leading "Error" prefix callers already match on.
    pub fn render(&self) -> String {
        match self {
            Self::Success(s) => s.clone(),
            Self::Failure { kind, message } => {
                format!("Error ({}): {message}", kind.label())
            }
        }
    }
}

impl From<ActionError> for ActionReply {
    fn from(e: ActionError) -> Self {
        Self::Failure {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

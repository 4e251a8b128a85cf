//! Gateway error types.

use crate::directive::DirectiveKind;

/// Failure reported by the command interpreter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The interpreter ran the directive and refused it. Routine: callers
    /// report it and carry on.
    #[error("{kind} rejected: {message}")]
    Rejected {
        kind: DirectiveKind,
        message: String,
    },

    /// The interpreter could not be reached at all.
    #[error("command interpreter unavailable: {message}")]
    Unavailable { message: String },
}

impl GatewayError {
    pub fn rejected(kind: DirectiveKind, message: impl Into<String>) -> Self {
        Self::Rejected {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Whether a multi-step sequence should stop instead of continuing.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Rejected { message, .. } | Self::Unavailable { message } => message,
        }
    }
}

use std::fmt;

/// Classification of every failure the orchestration core can surface.
/// The transport layer maps kinds to status codes; nothing below it needs
/// to branch on anything finer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input the client can fix.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// Authenticated but not permitted.
    Unauthorized,
    /// Unexpected failure, typically a collaborator going down.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Internal => "internal",
        }
    }
}

/// The single error type of the two-slot result contract: a kind, a human
/// message, and the label of the component the failure originated in.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    kind: ErrorKind,
    message: String,
    component: &'static str,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            component,
        }
    }

    pub fn not_found(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            message: message.into(),
            component,
        }
    }

    pub fn unauthorized(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unauthorized,
            message: message.into(),
            component,
        }
    }

    /// Converts a collaborator failure into the contract at the boundary
    /// where the collaborator was invoked. The underlying failure is logged
    /// here and only here; layers above propagate the returned error without
    /// logging it again. `message` is what callers see, `source` stays in
    /// the logs.
    pub fn internal(
        component: &'static str,
        message: impl Into<String>,
        source: impl fmt::Display,
    ) -> Self {
        let message = message.into();
        tracing::error!(component, error = %source, "{message}");
        Self {
            kind: ErrorKind::Internal,
            message,
            component,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

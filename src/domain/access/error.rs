//! Boundary error taxonomy
//!
//! Every collaborator failure is mapped to one of these kinds before it
//! leaves the access layer.

use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Error)]
pub enum AccessError {
    /// Malformed or missing caller input, safe to show
    #[error("{0}")]
    Validation(String),

    /// Target absent or not publicly visible
    #[error("{0}")]
    NotFound(String),

    /// Credential absent, unknown or inactive
    #[error("Invalid or missing API key")]
    Authentication,

    #[error("Too many requests, please try again later")]
    RateLimited,

    /// Human verification evidence was rejected
    #[error("Verification failed")]
    Verification,

    #[error("{0}")]
    Conflict(String),

    /// A backing store or collaborator failed
    #[error("Dependency failure: {0}")]
    Dependency(String),
}

impl AccessError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn dependency(message: impl Into<String>) -> Self {
        Self::Dependency(message.into())
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Authentication => "authentication_error",
            Self::RateLimited => "rate_limited",
            Self::Verification => "verification_failed",
            Self::Conflict(_) => "conflict",
            Self::Dependency(_) => "dependency_error",
        }
    }
}

impl From<DomainError> for AccessError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::NotFound(message),
            DomainError::Validation { message } => Self::Validation(message),
            DomainError::Conflict { message } => Self::Conflict(message),
            other => Self::Dependency(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AccessError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{} {}", field, reason)
            })
            .collect();
        fields.sort();

        Self::Validation(fields.join(", "))
    }
}

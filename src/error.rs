use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::provider::ProviderError;

/// Message returned when a newsletter tries to connect a second domain.
pub const ALREADY_CONNECTED: &str = "A domain is already connected. Disconnect it first.";

/// Message returned when a domain name fails syntax validation.
pub const INVALID_NAME: &str = "Domain name invalid";

#[derive(Debug, Error)]
pub enum AppError {
    /// User-correctable: malformed name, or a domain is already connected.
    #[error("{0}")]
    InvalidDomain(String),

    /// Another newsletter has already verified this name.
    #[error("Domain already in use")]
    DomainClaimed,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn invalid_domain(reason: impl Into<String>) -> Self {
        Self::InvalidDomain(reason.into())
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Errors the tenant can fix by choosing a different input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::InvalidDomain(_) | Self::DomainClaimed)
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }
    }

    if let sqlx::Error::ColumnDecode { index, source } = &e {
        return AppError::internal(
            "Failed to decode domain row",
            json!({ "column": index, "reason": source.to_string() }),
        );
    }

    AppError::internal("Database error", json!({ "reason": e.to_string() }))
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::internal("Migration failed", json!({ "reason": e.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_domain_message_is_the_reason() {
        let err = AppError::invalid_domain(ALREADY_CONNECTED);
        assert_eq!(err.to_string(), ALREADY_CONNECTED);

        let err = AppError::invalid_domain(INVALID_NAME);
        assert_eq!(err.to_string(), "Domain name invalid");
    }

    #[test]
    fn test_domain_claimed_message() {
        assert_eq!(AppError::DomainClaimed.to_string(), "Domain already in use");
    }

    #[test]
    fn test_provider_error_is_transparent() {
        let err = AppError::from(ProviderError::Other("Resend Error".to_string()));
        assert_eq!(err.to_string(), "Resend Error");
        assert!(!err.is_user_correctable());
    }

    #[test]
    fn test_user_correctable() {
        assert!(AppError::DomainClaimed.is_user_correctable());
        assert!(AppError::invalid_domain("x").is_user_correctable());
        assert!(!AppError::internal("boom", json!({})).is_user_correctable());
    }
}

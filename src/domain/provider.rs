//! Email provider identity API as seen by the domain layer.

use async_trait::async_trait;

use crate::domain::entities::{Identity, UnknownStatus};

/// Failure reported by (or while talking to) the identity provider.
///
/// Passed through the workflow unchanged; never retried here.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected status from provider: {0}")]
    UnexpectedStatus(String),

    #[error("{0}")]
    Other(String),
}

impl From<UnknownStatus> for ProviderError {
    fn from(err: UnknownStatus) -> Self {
        ProviderError::UnexpectedStatus(err.0)
    }
}

/// Create / fetch / delete operations on provider-side sending identities.
///
/// # Implementations
///
/// - [`crate::infrastructure::provider::ResendClient`] - Resend REST API
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers `domain_name` with the provider and returns the records to publish.
    async fn create_identity(&self, domain_name: &str) -> Result<Identity, ProviderError>;

    /// Fetches the current verification snapshot.
    async fn get_identity(&self, provider_domain_id: &str) -> Result<Identity, ProviderError>;

    /// Removes the identity from the provider.
    async fn delete_identity(&self, provider_domain_id: &str) -> Result<(), ProviderError>;
}

/// Deletes the provider identity, or does nothing when none was ever created.
pub async fn delete_identity_if_registered<P>(
    provider: &P,
    provider_domain_id: Option<&str>,
) -> Result<(), ProviderError>
where
    P: IdentityProvider + ?Sized,
{
    match provider_domain_id {
        Some(id) => provider.delete_identity(id).await,
        None => Ok(()),
    }
}

//! Sending domain registration and verification workflow.

use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::entities::{Domain, DomainRegistration, NewDomain, StatusSync};
use crate::domain::provider::{IdentityProvider, ProviderError, delete_identity_if_registered};
use crate::domain::repositories::{DomainRepository, DomainTransaction};
use crate::error::{ALREADY_CONNECTED, AppError, INVALID_NAME};
use crate::utils::domain_name::{is_valid_domain_name, normalize_domain_name};

/// Connects, syncs, verifies and disconnects newsletter sending domains.
///
/// Enforces:
/// - At most one domain per newsletter
/// - A name verified by another newsletter cannot be claimed (first-verified-wins)
/// - Registration is atomic: the record, the provider identity data and the first
///   status sync are committed together or not at all
///
/// The provider is called while the registration transaction is open, so no
/// local record can outlive a failed create-identity call.
pub struct SendingDomainService<R: DomainRepository, P: IdentityProvider> {
    repository: Arc<R>,
    provider: Arc<P>,
}

impl<R: DomainRepository, P: IdentityProvider> SendingDomainService<R, P> {
    /// Creates a new sending domain service.
    pub fn new(repository: Arc<R>, provider: Arc<P>) -> Self {
        Self {
            repository,
            provider,
        }
    }

    /// Connects a custom sending domain to a newsletter.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidDomain`] if the name is malformed or the
    /// newsletter already has a domain.
    /// Returns [`AppError::DomainClaimed`] if another newsletter verified the name.
    /// Returns [`AppError::Provider`] unchanged if the provider fails; nothing is stored.
    pub async fn connect(&self, newsletter_id: i64, name: &str) -> Result<Domain, AppError> {
        let name = normalize_domain_name(name);
        if !is_valid_domain_name(&name) {
            return Err(AppError::invalid_domain(INVALID_NAME));
        }

        if self
            .repository
            .find_by_newsletter(newsletter_id)
            .await?
            .is_some()
        {
            return Err(AppError::invalid_domain(ALREADY_CONNECTED));
        }

        if self
            .repository
            .claimed_by_other(&name, newsletter_id)
            .await?
        {
            return Err(AppError::DomainClaimed);
        }

        let mut tx = self.repository.begin().await?;
        let result = self
            .create_within(tx.as_mut(), NewDomain { newsletter_id, name })
            .await;

        let domain = Self::finish(tx, result).await?;
        info!(
            newsletter_id,
            domain = %domain.name,
            verified = domain.is_verified(),
            "Sending domain connected"
        );
        Ok(domain)
    }

    /// Returns the domain connected to a newsletter.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the newsletter has no domain.
    pub async fn get_for_newsletter(&self, newsletter_id: i64) -> Result<Domain, AppError> {
        self.repository
            .find_by_newsletter(newsletter_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "No domain connected",
                    json!({ "newsletter_id": newsletter_id }),
                )
            })
    }

    /// Lists domains, optionally only those that are fully verified.
    pub async fn list_domains(&self, only_verified: bool) -> Result<Vec<Domain>, AppError> {
        self.repository.list(only_verified).await
    }

    /// Registers the domain with the provider if it never was, otherwise syncs it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the domain does not exist.
    /// Returns [`AppError::Provider`] if the provider fails.
    pub async fn register_or_sync(&self, domain_id: i64) -> Result<Domain, AppError> {
        let domain = self.find(domain_id).await?;
        if domain.is_registered() {
            return self.sync_domain(&domain).await;
        }

        let mut tx = self.repository.begin().await?;
        let result = self.register_within(tx.as_mut(), &domain).await;
        Self::finish(tx, result).await
    }

    /// Refreshes statuses and records from the provider in one update.
    ///
    /// On any failure the stored values are left as they were.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the domain does not exist.
    /// Returns [`AppError::Conflict`] if the domain was never registered.
    /// Returns [`AppError::Provider`] if the provider fails or reports an unknown status.
    pub async fn sync(&self, domain_id: i64) -> Result<Domain, AppError> {
        let domain = self.find(domain_id).await?;
        self.sync_domain(&domain).await
    }

    /// Syncs and reports whether the domain is fully verified.
    pub async fn verify(&self, domain_id: i64) -> Result<bool, AppError> {
        Ok(self.sync(domain_id).await?.is_verified())
    }

    /// Removes the newsletter's domain, provider identity first.
    ///
    /// If the provider refuses the deletion the local record is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the newsletter has no domain.
    /// Returns [`AppError::Provider`] if the provider identity could not be deleted.
    pub async fn disconnect(&self, newsletter_id: i64) -> Result<(), AppError> {
        let domain = self.get_for_newsletter(newsletter_id).await?;

        delete_identity_if_registered(self.provider.as_ref(), domain.provider_domain_id.as_deref())
            .await
            .inspect_err(|e| {
                warn!(
                    newsletter_id,
                    domain = %domain.name,
                    error = %e,
                    "Provider identity deletion failed; keeping domain"
                );
            })?;

        self.repository.delete(domain.id).await?;
        info!(newsletter_id, domain = %domain.name, "Sending domain disconnected");
        Ok(())
    }

    /// Records whether the tenant has published a DMARC record.
    pub async fn set_dmarc_added(
        &self,
        newsletter_id: i64,
        dmarc_added: bool,
    ) -> Result<Domain, AppError> {
        let domain = self.get_for_newsletter(newsletter_id).await?;
        self.repository.set_dmarc_added(domain.id, dmarc_added).await
    }

    async fn find(&self, domain_id: i64) -> Result<Domain, AppError> {
        self.repository
            .find_by_id(domain_id)
            .await?
            .ok_or_else(|| AppError::not_found("Domain not found", json!({ "id": domain_id })))
    }

    async fn create_within(
        &self,
        tx: &mut dyn DomainTransaction,
        new_domain: NewDomain,
    ) -> Result<Domain, AppError> {
        let domain = tx.insert(new_domain).await?;
        self.register_within(tx, &domain).await
    }

    /// Creates the provider identity, stores it, then syncs from a fresh fetch.
    async fn register_within(
        &self,
        tx: &mut dyn DomainTransaction,
        domain: &Domain,
    ) -> Result<Domain, AppError> {
        let identity = self.provider.create_identity(&domain.name).await?;
        let registration = DomainRegistration::from_identity(identity);
        let provider_domain_id = registration.provider_domain_id.clone();
        let registered = tx.record_registration(domain.id, registration).await?;

        let sync = self.fetch_snapshot(&provider_domain_id).await?;
        tx.apply_sync(registered.id, sync).await
    }

    async fn sync_domain(&self, domain: &Domain) -> Result<Domain, AppError> {
        let Some(provider_domain_id) = domain.provider_domain_id.as_deref() else {
            return Err(AppError::conflict(
                "Domain is not registered with the provider",
                json!({ "id": domain.id }),
            ));
        };

        let sync = self.fetch_snapshot(provider_domain_id).await?;
        self.repository.apply_sync(domain.id, sync).await
    }

    async fn fetch_snapshot(&self, provider_domain_id: &str) -> Result<StatusSync, AppError> {
        let identity = self.provider.get_identity(provider_domain_id).await?;
        Ok(StatusSync::from_identity(identity).map_err(ProviderError::from)?)
    }

    /// Commits on success; rolls back and returns the original error otherwise.
    async fn finish(
        tx: Box<dyn DomainTransaction>,
        result: Result<Domain, AppError>,
    ) -> Result<Domain, AppError> {
        match result {
            Ok(domain) => {
                tx.commit().await?;
                Ok(domain)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback of domain registration failed");
                }
                Err(e)
            }
        }
    }
}

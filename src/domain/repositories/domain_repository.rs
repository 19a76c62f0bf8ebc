//! Repository traits for sending domains.

use crate::domain::entities::{Domain, DomainRegistration, NewDomain, StatusSync};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for managing sending domains.
///
/// Reads and single-statement writes go straight through the repository.
/// Multi-step creation goes through [`DomainRepository::begin`], which hands
/// out a [`DomainTransaction`] whose writes are discarded unless committed.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgDomainRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryDomainRepository`] - In-process store
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_domain.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Finds a domain by its database ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Domain>, AppError>;

    /// Finds the domain connected to a newsletter, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_newsletter(&self, newsletter_id: i64) -> Result<Option<Domain>, AppError>;

    /// Returns true if a domain named `name` belongs to a different newsletter
    /// and has at least one status equal to `success`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn claimed_by_other(&self, name: &str, newsletter_id: i64) -> Result<bool, AppError>;

    /// Lists domains ordered by name, optionally only fully verified ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self, only_verified: bool) -> Result<Vec<Domain>, AppError>;

    /// Counts all domain records.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self) -> Result<i64, AppError>;

    /// Overwrites statuses and records in one update.
    ///
    /// Leaves the row untouched (including `updated_at`) when nothing differs.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the domain does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn apply_sync(&self, id: i64, sync: StatusSync) -> Result<Domain, AppError>;

    /// Sets the DMARC acknowledgement flag.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the domain does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn set_dmarc_added(&self, id: i64, dmarc_added: bool) -> Result<Domain, AppError>;

    /// Deletes a domain record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the domain does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Opens a unit of work for multi-step writes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the transaction cannot be started.
    async fn begin(&self) -> Result<Box<dyn DomainTransaction>, AppError>;
}

/// A unit of work over the domain store.
///
/// Nothing written through it is visible to others until [`commit`](Self::commit).
/// Dropping it without committing discards every write.
#[async_trait]
pub trait DomainTransaction: Send {
    /// Inserts a new pending domain.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the name is already taken.
    /// Returns [`AppError::InvalidDomain`] if the newsletter already has a domain.
    async fn insert(&mut self, new_domain: NewDomain) -> Result<Domain, AppError>;

    /// Stores the provider's create-identity result on an unregistered domain.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the domain already has a provider id.
    /// Returns [`AppError::NotFound`] if the domain does not exist.
    async fn record_registration(
        &mut self,
        id: i64,
        registration: DomainRegistration,
    ) -> Result<Domain, AppError>;

    /// Same as [`DomainRepository::apply_sync`], inside the unit of work.
    async fn apply_sync(&mut self, id: i64, sync: StatusSync) -> Result<Domain, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

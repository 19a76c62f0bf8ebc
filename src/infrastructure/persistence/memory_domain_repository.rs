//! In-process domain repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::domain::entities::{Domain, DomainRegistration, NewDomain, StatusSync};
use crate::domain::repositories::{DomainRepository, DomainTransaction};
use crate::error::{ALREADY_CONNECTED, AppError};

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    domains: BTreeMap<i64, Domain>,
}

impl Store {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn name_taken(&self, name: &str, except_id: Option<i64>) -> bool {
        self.domains
            .values()
            .any(|d| d.name == name && Some(d.id) != except_id)
    }

    fn newsletter_taken(&self, newsletter_id: i64) -> bool {
        self.domains
            .values()
            .any(|d| d.newsletter_id == newsletter_id)
    }
}

fn lock(store: &Mutex<Store>) -> Result<MutexGuard<'_, Store>, AppError> {
    store
        .lock()
        .map_err(|_| AppError::internal("Domain store lock poisoned", json!({})))
}

fn not_found(id: i64) -> AppError {
    AppError::not_found("Domain not found", json!({ "id": id }))
}

fn name_conflict(name: &str) -> AppError {
    AppError::conflict("Domain name already registered", json!({ "name": name }))
}

/// Domain repository backed by process memory.
///
/// Mirrors the PostgreSQL semantics the workflow relies on: unique names,
/// at most one domain per newsletter, transactional writes that vanish unless committed, and syncs that leave
/// `updated_at` alone when nothing changed.
///
/// # Use Cases
///
/// - Tests of the registration workflow without a database
#[derive(Clone, Default)]
pub struct InMemoryDomainRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryDomainRepository {
    pub fn new() -> Self {
        debug!("Using in-memory domain store");
        Self::default()
    }

    /// Creates a repository pre-populated with `domains`, keeping their ids.
    pub fn with_domains(domains: impl IntoIterator<Item = Domain>) -> Self {
        let mut store = Store::default();
        for domain in domains {
            store.next_id = store.next_id.max(domain.id);
            store.domains.insert(domain.id, domain);
        }
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

#[async_trait]
impl DomainRepository for InMemoryDomainRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Domain>, AppError> {
        Ok(lock(&self.store)?.domains.get(&id).cloned())
    }

    async fn find_by_newsletter(&self, newsletter_id: i64) -> Result<Option<Domain>, AppError> {
        Ok(lock(&self.store)?
            .domains
            .values()
            .find(|d| d.newsletter_id == newsletter_id)
            .cloned())
    }

    async fn claimed_by_other(&self, name: &str, newsletter_id: i64) -> Result<bool, AppError> {
        Ok(lock(&self.store)?
            .domains
            .values()
            .any(|d| d.name == name && d.newsletter_id != newsletter_id && d.has_any_success()))
    }

    async fn list(&self, only_verified: bool) -> Result<Vec<Domain>, AppError> {
        let store = lock(&self.store)?;
        let mut domains: Vec<Domain> = store
            .domains
            .values()
            .filter(|d| !only_verified || d.is_verified())
            .cloned()
            .collect();
        domains.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(domains)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(lock(&self.store)?.domains.len() as i64)
    }

    async fn apply_sync(&self, id: i64, sync: StatusSync) -> Result<Domain, AppError> {
        let mut store = lock(&self.store)?;
        let domain = store.domains.get_mut(&id).ok_or_else(|| not_found(id))?;
        if domain.apply_sync(sync) {
            domain.updated_at = Utc::now();
        }
        Ok(domain.clone())
    }

    async fn set_dmarc_added(&self, id: i64, dmarc_added: bool) -> Result<Domain, AppError> {
        let mut store = lock(&self.store)?;
        let domain = store.domains.get_mut(&id).ok_or_else(|| not_found(id))?;
        domain.dmarc_added = dmarc_added;
        domain.updated_at = Utc::now();
        Ok(domain.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        lock(&self.store)?
            .domains
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    async fn begin(&self) -> Result<Box<dyn DomainTransaction>, AppError> {
        Ok(Box::new(InMemoryDomainTransaction {
            store: Arc::clone(&self.store),
            view: BTreeMap::new(),
            writes: Vec::new(),
        }))
    }
}

/// One write recorded by an [`InMemoryDomainTransaction`], replayed on commit.
#[derive(Debug)]
enum StagedWrite {
    Insert(Domain),
    Register {
        id: i64,
        registration: DomainRegistration,
        at: DateTime<Utc>,
    },
    Sync {
        id: i64,
        sync: StatusSync,
        at: DateTime<Utc>,
    },
}

impl StagedWrite {
    /// Applies the write to `domains`. Only `Insert` creates a row; the other
    /// writes update the row as it is now and fail if it has gone.
    fn apply(self, domains: &mut BTreeMap<i64, Domain>) -> Result<(), AppError> {
        match self {
            StagedWrite::Insert(domain) => {
                if domains
                    .values()
                    .any(|d| d.name == domain.name && d.id != domain.id)
                {
                    return Err(name_conflict(&domain.name));
                }
                if domains
                    .values()
                    .any(|d| d.newsletter_id == domain.newsletter_id && d.id != domain.id)
                {
                    return Err(AppError::invalid_domain(ALREADY_CONNECTED));
                }
                domains.insert(domain.id, domain);
            }
            StagedWrite::Register {
                id,
                registration,
                at,
            } => {
                let domain = domains.get_mut(&id).ok_or_else(|| not_found(id))?;
                if let Some(existing) = &domain.provider_domain_id {
                    return Err(already_registered(id, existing));
                }
                domain.apply_registration(registration);
                domain.updated_at = at;
            }
            StagedWrite::Sync { id, sync, at } => {
                let domain = domains.get_mut(&id).ok_or_else(|| not_found(id))?;
                if domain.apply_sync(sync) {
                    domain.updated_at = at;
                }
            }
        }
        Ok(())
    }
}

fn already_registered(id: i64, provider_domain_id: &str) -> AppError {
    AppError::conflict(
        "Domain is already registered with the provider",
        json!({ "id": id, "provider_domain_id": provider_domain_id }),
    )
}

/// Staged writes against an [`InMemoryDomainRepository`].
///
/// Reads inside the transaction see its own writes. Commit replays them in
/// order against the rows as they are at commit time, all or nothing, so a
/// row deleted meanwhile is not brought back and unrelated columns written
/// meanwhile (e.g. `dmarc_added`) are kept.
///
/// Ids are allocated eagerly and not reused after a rollback, like a
/// PostgreSQL sequence.
pub struct InMemoryDomainTransaction {
    store: Arc<Mutex<Store>>,
    view: BTreeMap<i64, Domain>,
    writes: Vec<StagedWrite>,
}

impl InMemoryDomainTransaction {
    fn current(&self, id: i64) -> Result<Domain, AppError> {
        if let Some(domain) = self.view.get(&id) {
            return Ok(domain.clone());
        }
        lock(&self.store)?
            .domains
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl DomainTransaction for InMemoryDomainTransaction {
    async fn insert(&mut self, new_domain: NewDomain) -> Result<Domain, AppError> {
        let id = {
            let mut store = lock(&self.store)?;
            let staged_taken = self.view.values().any(|d| d.name == new_domain.name);
            if staged_taken || store.name_taken(&new_domain.name, None) {
                return Err(name_conflict(&new_domain.name));
            }
            let newsletter_staged = self
                .view
                .values()
                .any(|d| d.newsletter_id == new_domain.newsletter_id);
            if newsletter_staged || store.newsletter_taken(new_domain.newsletter_id) {
                return Err(AppError::invalid_domain(ALREADY_CONNECTED));
            }
            store.allocate_id()
        };

        let domain = Domain::pending(id, new_domain.newsletter_id, new_domain.name, Utc::now());
        self.view.insert(id, domain.clone());
        self.writes.push(StagedWrite::Insert(domain.clone()));
        Ok(domain)
    }

    async fn record_registration(
        &mut self,
        id: i64,
        registration: DomainRegistration,
    ) -> Result<Domain, AppError> {
        let mut domain = self.current(id)?;
        if let Some(existing) = &domain.provider_domain_id {
            return Err(already_registered(id, existing));
        }

        let at = Utc::now();
        domain.apply_registration(registration.clone());
        domain.updated_at = at;
        self.view.insert(id, domain.clone());
        self.writes.push(StagedWrite::Register {
            id,
            registration,
            at,
        });
        Ok(domain)
    }

    async fn apply_sync(&mut self, id: i64, sync: StatusSync) -> Result<Domain, AppError> {
        let mut domain = self.current(id)?;
        let at = Utc::now();
        if domain.apply_sync(sync.clone()) {
            domain.updated_at = at;
        }
        self.view.insert(id, domain.clone());
        self.writes.push(StagedWrite::Sync { id, sync, at });
        Ok(domain)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let Self { store, writes, .. } = *self;
        let mut store = lock(&store)?;

        let mut domains = store.domains.clone();
        for write in writes {
            write.apply(&mut domains)?;
        }
        store.domains = domains;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        debug!(staged = self.writes.len(), "Discarding staged domain writes");
        Ok(())
    }
}

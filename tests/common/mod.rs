#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use newsletter_domains::domain::entities::{Domain, DomainStatus, Identity, SpfStatus, VerificationRecord};
use newsletter_domains::domain::provider::{IdentityProvider, ProviderError};
use newsletter_domains::infrastructure::persistence::InMemoryDomainRepository;
use newsletter_domains::prelude::SendingDomainService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type TestService = SendingDomainService<InMemoryDomainRepository, FakeProvider>;

pub fn record(kind: &str, record_type: &str, status: &str, value: &str) -> VerificationRecord {
    VerificationRecord {
        record: kind.to_string(),
        record_type: record_type.to_string(),
        name: "send.example.com".to_string(),
        value: value.to_string(),
        status: Some(status.to_string()),
        ttl: Some("Auto".to_string()),
        priority: (record_type == "MX").then_some(10),
    }
}

/// The identity the fake provider reports: id `pid-1`, region `us-east-1`,
/// every record in `status`.
pub fn identity(name: &str, status: &str) -> Identity {
    Identity {
        id: "pid-1".to_string(),
        name: Some(name.to_string()),
        status: Some(status.to_string()),
        region: Some("us-east-1".to_string()),
        records: vec![
            record("DKIM", "TXT", status, "p=mock-key"),
            record("SPF", "MX", status, "feedback-smtp.us-east-1.amazonses.com"),
            record("SPF", "TXT", status, "v=spf1 include:amazonses.com ~all"),
        ],
    }
}

pub fn verified_domain(id: i64, newsletter_id: i64, name: &str) -> Domain {
    let mut domain = Domain::pending(id, newsletter_id, name.to_string(), Utc::now());
    domain.status = DomainStatus::Success;
    domain.dkim_status = DomainStatus::Success;
    domain.spf_status = SpfStatus::Success;
    domain.provider_domain_id = Some(format!("pid-{id}"));
    domain
}

pub fn unregistered_domain(id: i64, newsletter_id: i64, name: &str) -> Domain {
    Domain::pending(id, newsletter_id, name.to_string(), Utc::now())
}

/// Scriptable in-process identity provider.
pub struct FakeProvider {
    status: Mutex<String>,
    create_error: Mutex<Option<String>>,
    delete_error: Mutex<Option<String>>,
    pub creates: AtomicUsize,
    pub fetches: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl FakeProvider {
    /// A provider that verifies every identity immediately.
    pub fn verified() -> Self {
        Self::with_status("verified")
    }

    pub fn with_status(status: &str) -> Self {
        Self {
            status: Mutex::new(status.to_string()),
            create_error: Mutex::new(None),
            delete_error: Mutex::new(None),
            creates: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn set_status(&self, status: &str) {
        *self.status.lock().unwrap() = status.to_string();
    }

    pub fn fail_create(&self, message: &str) {
        *self.create_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_delete(&self, message: &str) {
        *self.delete_error.lock().unwrap() = Some(message.to_string());
    }

    fn current(&self, name: &str) -> Identity {
        identity(name, &self.status.lock().unwrap())
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn create_identity(&self, domain_name: &str) -> Result<Identity, ProviderError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.create_error.lock().unwrap().clone() {
            return Err(ProviderError::Other(message));
        }
        // A new identity always starts unverified.
        Ok(identity(domain_name, "not_started"))
    }

    async fn get_identity(&self, _provider_domain_id: &str) -> Result<Identity, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.current("example.com"))
    }

    async fn delete_identity(&self, _provider_domain_id: &str) -> Result<(), ProviderError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.delete_error.lock().unwrap().clone() {
            return Err(ProviderError::Other(message));
        }
        Ok(())
    }
}

pub fn create_service(
    repository: InMemoryDomainRepository,
    provider: Arc<FakeProvider>,
) -> TestService {
    SendingDomainService::new(Arc::new(repository), provider)
}

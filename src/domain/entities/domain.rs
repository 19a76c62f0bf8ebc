//! Sending domain entity and its verification state.

use chrono::{DateTime, Utc};

use super::identity::{Identity, VerificationRecord};
use super::status::{DomainStatus, SpfStatus, UnknownStatus, parse_provider_status};

/// A custom sending domain owned by one newsletter.
///
/// `provider_domain_id` is `None` until the provider has created the identity;
/// afterwards it never changes and syncs only refresh statuses and records.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub id: i64,
    pub newsletter_id: i64,
    pub name: String,
    pub status: DomainStatus,
    pub dkim_status: DomainStatus,
    pub spf_status: SpfStatus,
    pub provider_domain_id: Option<String>,
    pub provider_records: Vec<VerificationRecord>,
    pub public_key: Option<String>,
    pub region: String,
    pub dmarc_added: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    /// A freshly inserted record: every status pending, nothing registered.
    pub fn pending(id: i64, newsletter_id: i64, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            newsletter_id,
            name,
            status: DomainStatus::default(),
            dkim_status: DomainStatus::default(),
            spf_status: SpfStatus::default(),
            provider_domain_id: None,
            provider_records: Vec::new(),
            public_key: None,
            region: Self::DEFAULT_REGION.to_string(),
            dmarc_added: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// True only when overall, DKIM and SPF statuses are all `success`.
    pub fn is_verified(&self) -> bool {
        self.status.is_success() && self.dkim_status.is_success() && self.spf_status.is_success()
    }

    /// True when any of the three statuses is `success`; such a record claims its name.
    pub fn has_any_success(&self) -> bool {
        self.status.is_success() || self.dkim_status.is_success() || self.spf_status.is_success()
    }

    pub fn is_registered(&self) -> bool {
        self.provider_domain_id.is_some()
    }

    /// Applies a registration result. Callers guarantee the record is unregistered.
    pub fn apply_registration(&mut self, registration: DomainRegistration) {
        self.provider_domain_id = Some(registration.provider_domain_id);
        self.provider_records = registration.provider_records;
        self.public_key = registration.public_key;
        if let Some(region) = registration.region {
            self.region = region;
        }
    }

    /// Overwrites all synced fields at once. Returns whether anything changed.
    pub fn apply_sync(&mut self, sync: StatusSync) -> bool {
        if sync.matches(self) {
            return false;
        }
        self.status = sync.status;
        self.dkim_status = sync.dkim_status;
        self.spf_status = sync.spf_status;
        self.provider_records = sync.provider_records;
        true
    }
}

/// Input data for inserting a new domain.
#[derive(Debug, Clone)]
pub struct NewDomain {
    pub newsletter_id: i64,
    pub name: String,
}

/// Data captured from the provider's create-identity response.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainRegistration {
    pub provider_domain_id: String,
    pub region: Option<String>,
    pub provider_records: Vec<VerificationRecord>,
    pub public_key: Option<String>,
}

impl DomainRegistration {
    pub fn from_identity(identity: Identity) -> Self {
        let public_key = identity.dkim_record().map(|r| r.value.clone());
        Self {
            provider_domain_id: identity.id,
            region: identity.region,
            provider_records: identity.records,
            public_key,
        }
    }
}

/// One consistent snapshot of the synced fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSync {
    pub status: DomainStatus,
    pub dkim_status: DomainStatus,
    pub spf_status: SpfStatus,
    pub provider_records: Vec<VerificationRecord>,
}

impl StatusSync {
    /// Builds a snapshot from a fetched identity.
    ///
    /// DKIM status comes from the first `DKIM` record, SPF status from the
    /// first `SPF` record of type `TXT`, overall status from the identity.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStatus`] if any mapped status is outside its field's vocabulary;
    /// no partial snapshot is produced.
    pub fn from_identity(identity: Identity) -> Result<Self, UnknownStatus> {
        let dkim = identity.dkim_record().and_then(|r| r.status.as_deref());
        let spf = identity.spf_txt_record().and_then(|r| r.status.as_deref());

        let dkim_status = parse_provider_status(dkim)?;
        let spf_status = parse_provider_status(spf)?;
        let status = parse_provider_status(identity.status.as_deref())?;

        Ok(Self {
            status,
            dkim_status,
            spf_status,
            provider_records: identity.records,
        })
    }

    pub fn matches(&self, domain: &Domain) -> bool {
        self.status == domain.status
            && self.dkim_status == domain.dkim_status
            && self.spf_status == domain.spf_status
            && self.provider_records == domain.provider_records
    }
}

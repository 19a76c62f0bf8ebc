//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Domain`] - A newsletter's custom sending domain and its verification state
//! - [`Identity`] - The provider's view of that domain, with [`VerificationRecord`]s
//! - [`DomainStatus`] / [`SpfStatus`] - Per-field status vocabularies
//!
//! # Design Pattern
//!
//! Separate structs describe each write against a domain:
//! - `NewDomain` - Inserting a record
//! - `DomainRegistration` - Storing the provider's create-identity result
//! - `StatusSync` - Overwriting statuses from one fetched snapshot

pub mod domain;
pub mod identity;
pub mod status;

pub use domain::{Domain, DomainRegistration, NewDomain, StatusSync};
pub use identity::{Identity, VerificationRecord};
pub use status::{DomainStatus, SpfStatus, UnknownStatus, map_status, parse_provider_status};

//! Repository implementations.
//!
//! # Repositories
//!
//! - [`PgDomainRepository`] - PostgreSQL storage via SQLx
//! - [`InMemoryDomainRepository`] - Process-local storage for tests

pub mod memory_domain_repository;
pub mod pg_domain_repository;

pub use memory_domain_repository::{InMemoryDomainRepository, InMemoryDomainTransaction};
pub use pg_domain_repository::{PgDomainRepository, PgDomainTransaction};

//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented by concrete repositories in the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Testing
//!
//! See integration tests in `tests/repository_domain.rs` for usage examples.

pub mod domain_repository;

pub use domain_repository::{DomainRepository, DomainTransaction};

#[cfg(test)]
pub use domain_repository::MockDomainRepository;

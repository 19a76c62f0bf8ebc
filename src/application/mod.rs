//! Application layer services implementing business logic.
//!
//! Services orchestrate repository calls, provider calls and business rules,
//! and expose the operations callers (the newsletter aggregate, the admin tool)
//! use.
//!
//! # Available Services
//!
//! - [`services::sending_domain_service::SendingDomainService`] - Connect, sync,
//!   verify and disconnect newsletter sending domains
pub mod services;

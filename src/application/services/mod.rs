//! Business logic services for the application layer.

pub mod sending_domain_service;

pub use sending_domain_service::SendingDomainService;

//! Domain layer containing business entities and contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Sending domain, provider identity, status vocabularies
//! - [`repositories`] - Data access trait definitions
//! - [`provider`] - Identity provider trait and its error type
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository and provider traits define contracts implemented by the infrastructure layer
//! - Orchestration lives in services (see [`crate::application::services`])

pub mod entities;
pub mod provider;
pub mod repositories;

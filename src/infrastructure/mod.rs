//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - Domain store implementations (PostgreSQL, in-memory)
//! - [`provider`] - Email provider API clients

pub mod persistence;
pub mod provider;

//! Utility functions shared across layers.
//!
//! - [`domain_name`] - Domain name normalization and syntax validation
//! - [`db_error`] - Classification of PostgreSQL errors

pub mod db_error;
pub mod domain_name;

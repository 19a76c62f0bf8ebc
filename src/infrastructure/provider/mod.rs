//! Email provider API clients.
//!
//! - [`ResendClient`] - Resend domains API over HTTPS

pub mod resend_client;

pub use resend_client::ResendClient;

//! Resend domains API client.
//!
//! Endpoints used:
//! - `POST /domains` - create an identity for a domain name
//! - `GET /domains/{id}` - fetch the identity with per-record statuses
//! - `DELETE /domains/{id}` - remove the identity

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::entities::Identity;
use crate::domain::provider::{IdentityProvider, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Debug, Serialize)]
struct CreateDomainRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for the Resend domains API.
#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ResendClient {
    /// Creates a client against the public Resend API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (self-hosted proxy, tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-2xx response into [`ProviderError::Api`].
    async fn check(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);

        warn!(status = status.as_u16(), %message, "Resend request failed");
        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl IdentityProvider for ResendClient {
    async fn create_identity(&self, domain_name: &str) -> Result<Identity, ProviderError> {
        debug!(domain = domain_name, "Creating Resend identity");

        let response = self
            .client
            .post(self.url("/domains"))
            .bearer_auth(&self.api_key)
            .json(&CreateDomainRequest { name: domain_name })
            .send()
            .await?;

        let identity = Self::check(response).await?.json::<Identity>().await?;
        debug!(domain = domain_name, id = %identity.id, "Resend identity created");
        Ok(identity)
    }

    async fn get_identity(&self, provider_domain_id: &str) -> Result<Identity, ProviderError> {
        debug!(id = provider_domain_id, "Fetching Resend identity");

        let response = self
            .client
            .get(self.url(&format!("/domains/{provider_domain_id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Ok(Self::check(response).await?.json::<Identity>().await?)
    }

    async fn delete_identity(&self, provider_domain_id: &str) -> Result<(), ProviderError> {
        debug!(id = provider_domain_id, "Deleting Resend identity");

        let response = self
            .client
            .delete(self.url(&format!("/domains/{provider_domain_id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

//! HTTP access to the broker management API.
//!
//! [`BrokerApi`] is the seam between the collector and the network: the
//! exporter uses [`HttpBroker`], tests plug in fakes.

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::error::ScrapeError;

/// Raw management API answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, undecoded.
    pub body: String,
}

impl BrokerResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs an authenticated GET against the broker.
///
/// Implementations report only transport failures as errors; any HTTP status
/// is returned as a [`BrokerResponse`] for the caller to judge.
#[async_trait]
pub trait BrokerApi: Send + Sync {
    async fn get(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> Result<BrokerResponse, ScrapeError>;
}

/// [`BrokerApi`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpBroker {
    client: reqwest::Client,
}

impl HttpBroker {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BrokerApi for HttpBroker {
    async fn get(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> Result<BrokerResponse, ScrapeError> {
        let response = self
            .client
            .get(url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| ScrapeError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ScrapeError::transport(format!("failed to read body: {}", e)))?;

        trace!(url, status, bytes = body.len(), "Broker API response");

        Ok(BrokerResponse { status, body })
    }
}

//! HTTP seam for discovery and JWKS retrieval

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::KeyFetchError;

/// Fetches a JSON document over HTTP GET
///
/// The key manager only needs this one operation; swapping the
/// implementation lets tests serve canned documents without a network.
#[async_trait]
pub trait HttpFetcher: Send + Sync + std::fmt::Debug {
    /// GET `url` and decode the body as JSON
    ///
    /// # Errors
    ///
    /// Any transport failure, non-success status or undecodable body.
    async fn fetch_json(&self, url: &Url) -> Result<serde_json::Value, KeyFetchError>;
}

/// [`HttpFetcher`] backed by `reqwest`
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Create a fetcher with the given per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for ReqwestFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestFetcher")
            .field("client", &"<reqwest::Client>")
            .finish()
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch_json(&self, url: &Url) -> Result<serde_json::Value, KeyFetchError> {
        debug!(url = %url, "GET");

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeyFetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| KeyFetchError::Decode {
            document: "JSON",
            source,
        })
    }
}

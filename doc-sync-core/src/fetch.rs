use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::contract::{FetchError, FetchResult, Fetcher, Location};
use crate::error::SyncError;

const USER_AGENT: &str = concat!("doc-sync/", env!("CARGO_PKG_VERSION"));

/// Reads documents from disk or over plain unauthenticated HTTP GET.
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    client: Client,
    timeout: Duration,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                error!(error = ?e, "Failed to build HTTP client");
                SyncError::Config(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client, timeout })
    }

    async fn fetch_local(&self, path: &Path) -> FetchResult {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                debug!(path = %path.display(), size = content.len(), "Read local document");
                Ok(content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "Local document does not exist");
                Err(FetchError::NotFound)
            }
            Err(e) => {
                error!(error = ?e, path = %path.display(), "Failed to read local document");
                Err(FetchError::Transient(format!("{}: {e}", path.display())))
            }
        }
    }

    async fn fetch_remote(&self, url: &str) -> FetchResult {
        info!(url = %url, "Fetching remote document");
        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                error!(url = %url, timeout_secs = self.timeout.as_secs(), "Request timed out");
                return Err(FetchError::Transient(format!(
                    "request to {url} timed out after {:?}",
                    self.timeout
                )));
            }
            Err(e) => {
                error!(error = ?e, url = %url, "Request failed");
                return Err(FetchError::Transient(format!("request to {url} failed: {e}")));
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(url = %url, "Remote document not found");
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            error!(status = %status, url = %url, "Content host returned an error status");
            return Err(FetchError::Transient(format!("HTTP {} for {url}", status.as_u16())));
        }

        match response.text().await {
            Ok(text) => {
                debug!(url = %url, size = text.len(), "Downloaded remote document");
                Ok(text)
            }
            Err(e) => {
                error!(error = ?e, url = %url, "Failed to read response body");
                Err(FetchError::Transient(format!("failed to read body of {url}: {e}")))
            }
        }
    }
}

#[async_trait]
impl Fetcher for DefaultFetcher {
    async fn fetch(&self, location: &Location) -> FetchResult {
        match location {
            Location::Local(path) => self.fetch_local(path).await,
            Location::Remote(url) => self.fetch_remote(url).await,
        }
    }
}

use async_trait::async_trait;
use fleetstat_domain::{DirectoryEntry, DirectoryFetcher, DomainError, DomainResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Envelope returned by the external directory API.
#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    status: String,
    data: Vec<DirectoryEntry>,
}

/// HTTP client for the external device directory.
///
/// One synchronous fetch returns the full current directory; there is no
/// pagination and no incremental delta. Any transport failure, non-2xx
/// response, decode failure, or non-"1" envelope status is a fetch error.
pub struct HttpDirectoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::DirectoryFetchFailed(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl DirectoryFetcher for HttpDirectoryClient {
    async fn fetch_directory(&self) -> DomainResult<Vec<DirectoryEntry>> {
        let url = format!("{}/v1/directory", self.base_url);
        debug!(url = %url, "fetching device directory");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::DirectoryFetchFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DomainError::DirectoryFetchFailed(format!(
                "directory API returned {}",
                response.status()
            )));
        }

        let body: DirectoryResponse = response
            .json()
            .await
            .map_err(|e| DomainError::DirectoryFetchFailed(format!("decode failed: {e}")))?;

        if body.status != "1" {
            return Err(DomainError::DirectoryFetchFailed(format!(
                "directory API reported status '{}'",
                body.status
            )));
        }

        Ok(body.data)
    }
}

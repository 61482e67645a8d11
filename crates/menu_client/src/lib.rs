use reqwest::{Client, StatusCode};
use shared::{domain::MenuItem, protocol::MenuResponse};
use thiserror::Error;
use tracing::debug;

/// Header carrying the content-API credential.
pub const API_KEY_HEADER: &str = "X-API-KEY";

#[derive(Debug, Error)]
pub enum MenuFetchError {
    #[error("menu request failed: {0}")]
    Transport(reqwest::Error),
    #[error("menu endpoint returned {status}")]
    Status { status: StatusCode },
    #[error("failed to decode menu response: {0}")]
    Decode(reqwest::Error),
}

/// Read-only client for the external menu catalog. One-shot fetch semantics:
/// no caching, no pagination, no retry — a failed fetch leaves the menu empty
/// and is reported to the caller for logging.
pub struct MenuClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl MenuClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn fetch_menu(&self) -> Result<Vec<MenuItem>, MenuFetchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(MenuFetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MenuFetchError::Status { status });
        }

        let body: MenuResponse = response.json().await.map_err(MenuFetchError::Decode)?;
        debug!(items = body.contents.len(), "menu fetched");
        Ok(body.contents)
    }

    /// Downloads a menu image. Shares the client; failures are non-fatal to
    /// the caller (the item renders without its picture).
    pub async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, MenuFetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(MenuFetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MenuFetchError::Status { status });
        }

        let bytes = response.bytes().await.map_err(MenuFetchError::Decode)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

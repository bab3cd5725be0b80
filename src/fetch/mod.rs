use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use url::Url;

pub mod urls;

/// Retrieves a remote resource to a local path.
///
/// Implementations define their own failure modes; errors pass through to
/// the caller unchanged.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn download(&self, locator: &str, dest: &Path) -> Result<()>;
}

/// HTTP fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Reuse an existing client (connection pool, TLS config).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Download the given URL and save it to `dest`, creating parent
    /// directories as needed. Single attempt; an HTTP error status is a
    /// failure.
    async fn download(&self, locator: &str, dest: &Path) -> Result<()> {
        let url = Url::parse(locator)?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let resp = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;
        fs::write(dest, &bytes).await?;

        Ok(())
    }
}

//! Collaborator traits: the scraper that fetches records and the store that persists them.

use crate::{ArtifactHandle, ProductRecord};
use async_trait::async_trait;

/// Fetches search result pages for a query and extracts product records.
///
/// An empty result is a success. Implementations enforce their own network
/// and page-load limits and report expiry as [`ScrapeError::Timeout`].
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, query: &str, max_pages: u32)
        -> Result<Vec<ProductRecord>, ScrapeError>;
}

/// Persists the records of one job as a downloadable artifact.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write records under a name unique to this call.
    async fn save(
        &self,
        query: &str,
        records: &[ProductRecord],
    ) -> Result<ArtifactHandle, ArtifactError>;

    /// Read back the bytes stored for `handle`.
    async fn load(&self, handle: &ArtifactHandle) -> Result<Vec<u8>, ArtifactError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("scrape error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact io: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact encoding: {0}")]
    Encode(String),
    #[error("artifact not found: {0}")]
    NotFound(String),
}

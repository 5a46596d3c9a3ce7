//! Read-only access to the Modrinth catalog.

mod client;
mod types;

pub use client::ModrinthClient;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("authentication required, but MODRINTH_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("request to {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Operations the updater needs from a mod catalog.
#[async_trait::async_trait]
pub trait Catalog {
    /// Projects followed by the configured user.
    async fn get_follows(&self) -> CatalogResult<Vec<Project>>;

    /// Versions of `slug` matching the game version and loader, newest first.
    async fn get_project_versions(
        &self,
        slug: &str,
        game_version: &str,
        loader: &str,
    ) -> CatalogResult<Vec<Version>>;

    async fn get_project(&self, id_or_slug: &str) -> CatalogResult<Project>;

    /// Looks up the version a file belongs to by its SHA-1.
    async fn get_version_by_hash(&self, sha1: &str) -> CatalogResult<Version>;

    /// Raw file contents. Sent without credentials.
    async fn download_file(&self, url: &str) -> CatalogResult<Vec<u8>>;
}

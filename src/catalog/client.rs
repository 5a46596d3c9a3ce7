use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{Catalog, CatalogError, CatalogResult, Project, User, Version};
use crate::config::Config;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Modrinth v2 API client. Holds one pooled connection handle for the
/// lifetime of the process.
pub struct ModrinthClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    user: Option<String>,
}

impl ModrinthClient {
    pub fn new(config: &Config) -> CatalogResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()?;

        // Url::join drops the last path segment unless the base ends in '/'
        let mut base = config.api_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|source| CatalogError::InvalidUrl {
            url: base.clone(),
            source,
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            user: config.modrinth_user.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> CatalogResult<Url> {
        self.base_url
            .join(path)
            .map_err(|source| CatalogError::InvalidUrl {
                url: path.to_string(),
                source,
            })
    }

    fn authenticated(&self, request: RequestBuilder) -> CatalogResult<RequestBuilder> {
        let key = self.api_key.as_deref().ok_or(CatalogError::MissingApiKey)?;
        Ok(request.header(AUTHORIZATION, key))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> CatalogResult<T> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        let request = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .query(query);
        let response = self.authenticated(request)?.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn current_user(&self) -> CatalogResult<String> {
        if let Some(user) = &self.user {
            return Ok(user.clone());
        }
        let user: User = self.get_json("user", &[]).await?;
        debug!("Resolved API key owner {} ({})", user.username, user.id);
        Ok(user.id)
    }
}

#[async_trait::async_trait]
impl Catalog for ModrinthClient {
    async fn get_follows(&self) -> CatalogResult<Vec<Project>> {
        let user = self.current_user().await?;
        self.get_json(&format!("user/{}/follows", user), &[]).await
    }

    async fn get_project_versions(
        &self,
        slug: &str,
        game_version: &str,
        loader: &str,
    ) -> CatalogResult<Vec<Version>> {
        let query = [
            ("game_versions", serde_json::to_string(&[game_version])?),
            ("loaders", serde_json::to_string(&[loader])?),
        ];
        self.get_json(&format!("project/{}/version", slug), &query)
            .await
    }

    async fn get_project(&self, id_or_slug: &str) -> CatalogResult<Project> {
        self.get_json(&format!("project/{}", id_or_slug), &[]).await
    }

    async fn get_version_by_hash(&self, sha1: &str) -> CatalogResult<Version> {
        self.get_json(
            &format!("version_file/{}", sha1),
            &[("algorithm", "sha1".to_string())],
        )
        .await
    }

    async fn download_file(&self, url: &str) -> CatalogResult<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|source| CatalogError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        debug!("Downloading {}", parsed);
        let response = self
            .client
            .get(parsed)
            .header(ACCEPT, HeaderValue::from_static("application/octet-stream"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

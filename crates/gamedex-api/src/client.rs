//! HTTP client for the remote catalog

use crate::model::{Game, GameId, GamePage, NamedRef, ResultList, Screenshot};
use crate::{ApiError, CatalogApi, require_remote};
use gamedex_config::ApiConfig;
use reqwest::Url;
use serde::de::DeserializeOwned;

/// reqwest-backed [`CatalogApi`] implementation
pub struct CatalogClient {
    base_url: String,
    api_key: String,
    lang: String,
    page_size: u32,
    client: reqwest::Client,
}

impl CatalogClient {
    /// Create a new client from API settings
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Url::parse(&config.base_url)
            .map_err(|e| ApiError::Url(format!("{}: {}", config.base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(format!("Gamedex/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            lang: config.lang.clone(),
            page_size: config.page_size,
            client,
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Build `{base}/{path}` with the given query parameters
    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::Url(format!("{}: {}", raw, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    pub fn games_url(&self, page: u32) -> Result<Url, ApiError> {
        self.endpoint(
            "games",
            &[
                ("lang", self.lang.clone()),
                ("page", page.to_string()),
                ("page_size", self.page_size.to_string()),
            ],
        )
    }

    pub fn game_url(&self, id: GameId) -> Result<Url, ApiError> {
        let id = require_remote(id)?;
        self.endpoint(&format!("games/{}", id), &[("lang", self.lang.clone())])
    }

    pub fn screenshots_url(&self, id: GameId) -> Result<Url, ApiError> {
        let id = require_remote(id)?;
        self.endpoint(&format!("games/{}/screenshots", id), &[])
    }

    pub fn genres_url(&self) -> Result<Url, ApiError> {
        self.endpoint("genres", &[("lang", self.lang.clone())])
    }

    pub fn platforms_url(&self) -> Result<Url, ApiError> {
        self.endpoint("platforms/lists/parents", &[("lang", self.lang.clone())])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!("GET {}{}", url.origin().ascii_serialization(), url.path());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl CatalogApi for CatalogClient {
    async fn fetch_games(&self, page: u32) -> Result<GamePage, ApiError> {
        let url = self.games_url(page)?;
        let page_data: GamePage = self.get_json(url).await?;
        tracing::debug!(
            "Catalog page {}: {} games of {}",
            page,
            page_data.results.len(),
            page_data.count
        );
        Ok(page_data)
    }

    async fn fetch_game(&self, id: GameId) -> Result<Game, ApiError> {
        let url = self.game_url(id)?;
        self.get_json(url).await
    }

    async fn fetch_screenshots(&self, id: GameId) -> Result<Vec<String>, ApiError> {
        let url = self.screenshots_url(id)?;
        let list: ResultList<Screenshot> = self.get_json(url).await?;
        Ok(list.results.into_iter().map(|s| s.image).collect())
    }

    async fn fetch_genres(&self) -> Result<Vec<NamedRef>, ApiError> {
        let url = self.genres_url()?;
        let list: ResultList<NamedRef> = self.get_json(url).await?;
        Ok(list.results)
    }

    async fn fetch_platforms(&self) -> Result<Vec<NamedRef>, ApiError> {
        let url = self.platforms_url()?;
        let list: ResultList<NamedRef> = self.get_json(url).await?;
        Ok(list.results)
    }
}

/// Error text for a failed response
///
/// A JSON string body is used as-is, any other JSON is re-serialized
/// compactly, and non-JSON bodies are passed through trimmed.
pub fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status.to_string();
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(message)) => message,
        Ok(other) => other.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

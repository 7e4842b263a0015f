//! HTTP client for the PokéAPI endpoints consumed by the data core.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::error::{Error, Result};
use super::models::{
    EvolutionChainResponse, PagedResponse, PokemonResponse, SpeciesResponse, TypeResponse,
};

/// Default public API root.
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Read-only client for the remote data source.
///
/// The base URL is configurable so tests can point it at a local mock
/// server. All methods map HTTP failures to the crate error taxonomy:
/// 404 -> [`Error::NotFound`], 429 -> [`Error::RateLimited`], any other
/// non-success status -> [`Error::Api`], transport failures ->
/// [`Error::Network`].
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    client: Client,
    base_url: String,
}

impl PokeApiClient {
    /// Create a client against the public API with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against an arbitrary API root.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    /// Start building a client.
    pub fn builder() -> PokeApiClientBuilder {
        PokeApiClientBuilder::default()
    }

    /// The configured API root, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of the pokemon listing.
    pub async fn list_pokemon(&self, limit: usize, offset: usize) -> Result<PagedResponse> {
        let url = format!("{}/pokemon?limit={limit}&offset={offset}", self.base_url);
        self.get_json(&url).await
    }

    /// Fetch a pokemon record by name or numeric ID.
    pub async fn pokemon(&self, name_or_id: &str) -> Result<PokemonResponse> {
        let url = format!("{}/pokemon/{name_or_id}", self.base_url);
        self.get_json(&url).await
    }

    /// Fetch species metadata by numeric ID.
    pub async fn species(&self, id: u32) -> Result<SpeciesResponse> {
        let url = format!("{}/pokemon-species/{id}", self.base_url);
        self.get_json(&url).await
    }

    /// Fetch the version listing (small enough for one unpaged call).
    pub async fn versions(&self) -> Result<PagedResponse> {
        let url = format!("{}/version?limit=100", self.base_url);
        self.get_json(&url).await
    }

    /// Follow an absolute resource URL from another record and decode it
    /// as the given type. Used for species, type, pokemon, and evolution
    /// chain references embedded in responses.
    pub async fn fetch_url<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json(url).await
    }

    /// Fetch a type record (for its damage relations) by resource URL.
    pub async fn type_by_url(&self, url: &str) -> Result<TypeResponse> {
        self.get_json(url).await
    }

    /// Fetch species metadata by resource URL.
    pub async fn species_by_url(&self, url: &str) -> Result<SpeciesResponse> {
        self.get_json(url).await
    }

    /// Fetch an evolution chain by resource URL.
    pub async fn evolution_chain_by_url(&self, url: &str) -> Result<EvolutionChainResponse> {
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {url}");
        let resp = self.client.get(url).send().await?;
        let resp = Self::check_status(url, resp).await?;
        Ok(resp.json().await?)
    }

    async fn check_status(url: &str, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        match status {
            StatusCode::NOT_FOUND => Err(Error::not_found(url)),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(Error::RateLimited { retry_after })
            }
            _ => {
                let message = resp.text().await.unwrap_or_default();
                Err(Error::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

/// Builder for [`PokeApiClient`].
#[derive(Debug, Clone)]
pub struct PokeApiClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl Default for PokeApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl PokeApiClientBuilder {
    /// Override the API root.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PokeApiClient> {
        let client = Client::builder().timeout(self.timeout).build()?;
        Ok(PokeApiClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

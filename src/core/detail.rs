//! Detail aggregation: one entity identifier in, one display-ready
//! record out.
//!
//! The aggregate merges the entity record, its derived weakness set, the
//! locale-filtered species metadata, and the filtered version list. The
//! merge is all-or-nothing: a failed sub-fetch collapses the whole
//! aggregate into a single [`Error::Aggregation`] - no partial or
//! degraded record is ever returned.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::api::error::{Error, Result};
use crate::api::models::PokemonResponse;
use crate::api::PokeApiClient;

use super::cache::TtlCache;
use super::list::fetch_weakness_names;
use super::model::{Pokemon, PokemonDetail, VersionRef, Weakness, WEAKNESS_MULTIPLIER};

/// Locale used for descriptive species text.
pub const DEFAULT_LOCALE: &str = "en";

// ============================================================================
// CachedPokemonFetcher
// ============================================================================

/// State exposed by the cache-backed fetch handle.
#[derive(Debug, Clone)]
pub struct FetcherState {
    pub loading: bool,
    pub error: Option<Arc<Error>>,
}

/// Cache-backed single-entity fetch.
///
/// Raw entity records are cached by name in the in-memory tier; repeat
/// views within the TTL window are served without a network call.
pub struct CachedPokemonFetcher {
    client: Arc<PokeApiClient>,
    cache: Arc<TtlCache<PokemonResponse>>,
    in_flight: AtomicUsize,
    last_error: RwLock<Option<Arc<Error>>>,
}

impl CachedPokemonFetcher {
    pub fn new(client: Arc<PokeApiClient>, cache: Arc<TtlCache<PokemonResponse>>) -> Self {
        Self {
            client,
            cache,
            in_flight: AtomicUsize::new(0),
            last_error: RwLock::new(None),
        }
    }

    /// Fetch an entity record, reusing a fresh cached copy when present.
    pub async fn get(&self, name: &str) -> Result<PokemonResponse> {
        if let Some(cached) = self.cache.get(name).await {
            return Ok(cached);
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.client.pokemon(name).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match result {
            Ok(raw) => {
                *self.last_error.write().await = None;
                self.cache.put(name, raw.clone()).await;
                Ok(raw)
            }
            Err(e) => {
                // The caller gets the original failure with its class
                // intact; the state field keeps a display copy.
                *self.last_error.write().await = Some(Arc::new(snapshot_error(&e)));
                Err(e)
            }
        }
    }

    /// Drop every cached record.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn state(&self) -> FetcherState {
        FetcherState {
            loading: self.in_flight.load(Ordering::SeqCst) > 0,
            error: self.last_error.read().await.clone(),
        }
    }
}

/// Display copy of an error for the snapshot state field. The original
/// cannot be cloned (transport errors are not `Clone`), so the copy
/// keeps the classification where it can and the message everywhere.
fn snapshot_error(err: &Error) -> Error {
    match err {
        Error::NotFound { resource } => Error::not_found(resource.clone()),
        Error::RateLimited { retry_after } => Error::RateLimited {
            retry_after: *retry_after,
        },
        other => Error::Api {
            status: other.status().unwrap_or(0),
            message: other.to_string(),
        },
    }
}

// ============================================================================
// DetailAggregator
// ============================================================================

/// Builds the display-ready aggregate for one entity name.
pub struct DetailAggregator {
    client: Arc<PokeApiClient>,
    fetcher: Arc<CachedPokemonFetcher>,
    locale: String,
}

impl DetailAggregator {
    pub fn new(client: Arc<PokeApiClient>, fetcher: Arc<CachedPokemonFetcher>) -> Self {
        Self {
            client,
            fetcher,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Override the species-text locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Fetch and merge everything for one entity. All-or-nothing.
    pub async fn fetch(&self, name: &str) -> Result<PokemonDetail> {
        if name.is_empty() {
            return Err(Error::not_found("pokemon/"));
        }

        let raw = self
            .fetcher
            .get(name)
            .await
            .map_err(|e| Error::aggregation("pokemon", e))?;

        let weakness_names = fetch_weakness_names(&self.client, &raw)
            .await
            .map_err(|e| Error::aggregation("type weaknesses", e))?;

        let species = self
            .client
            .species_by_url(&raw.species.url)
            .await
            .map_err(|e| Error::aggregation("species", e))?;

        let versions = self
            .client
            .versions()
            .await
            .map_err(|e| Error::aggregation("versions", e))?;

        let fields = PokemonDetail::species_fields(&species, &self.locale);
        let weaknesses = weakness_names
            .iter()
            .map(|n| Weakness {
                type_name: n.clone(),
                multiplier: WEAKNESS_MULTIPLIER,
            })
            .collect();

        Ok(PokemonDetail {
            pokemon: Pokemon::from_response(raw, weakness_names),
            weaknesses,
            description: fields.description,
            category: fields.category,
            egg_groups: fields.egg_groups,
            hatch_counter: fields.hatch_counter,
            gender: fields.gender,
            capture_rate: fields.capture_rate,
            base_happiness: fields.base_happiness,
            habitat: fields.habitat,
            growth_rate: fields.growth_rate,
            generation: fields.generation,
            versions: versions
                .results
                .into_iter()
                .filter(|v| v.name.contains("red") || v.name.contains("blue"))
                .map(|v| VersionRef {
                    name: v.name,
                    url: v.url,
                })
                .collect(),
        })
    }
}

// ============================================================================
// DetailLoader
// ============================================================================

/// Snapshot exposed to the detail view.
#[derive(Debug, Clone)]
pub struct DetailState {
    pub pokemon: Option<PokemonDetail>,
    pub loading: bool,
    pub error: Option<Arc<Error>>,
}

struct DetailInner {
    pokemon: Option<PokemonDetail>,
    loading: bool,
    error: Option<Arc<Error>>,
}

/// Hook-shaped handle around [`DetailAggregator`]: spawned fetches write
/// their outcome into a snapshot, guarded by a liveness flag so a torn
/// down view is never updated.
pub struct DetailLoader {
    aggregator: Arc<DetailAggregator>,
    inner: Arc<RwLock<DetailInner>>,
    alive: Arc<AtomicBool>,
}

impl DetailLoader {
    pub fn new(aggregator: Arc<DetailAggregator>) -> Self {
        Self {
            aggregator,
            inner: Arc::new(RwLock::new(DetailInner {
                pokemon: None,
                loading: false,
                error: None,
            })),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Fetch the aggregate for `name`, updating the snapshot.
    pub async fn load(&self, name: &str) {
        run_load(
            self.aggregator.clone(),
            self.inner.clone(),
            self.alive.clone(),
            name.to_string(),
        )
        .await;
    }

    /// Spawn [`DetailLoader::load`] as a background task.
    pub fn spawn_load(&self, name: String) -> JoinHandle<()> {
        let aggregator = self.aggregator.clone();
        let inner = self.inner.clone();
        let alive = self.alive.clone();
        tokio::spawn(run_load(aggregator, inner, alive, name))
    }

    pub async fn snapshot(&self) -> DetailState {
        let inner = self.inner.read().await;
        DetailState {
            pokemon: inner.pokemon.clone(),
            loading: inner.loading,
            error: inner.error.clone(),
        }
    }

    /// Stop applying updates from in-flight fetches.
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

async fn run_load(
    aggregator: Arc<DetailAggregator>,
    inner: Arc<RwLock<DetailInner>>,
    alive: Arc<AtomicBool>,
    name: String,
) {
    {
        let mut inner = inner.write().await;
        inner.loading = true;
        inner.error = None;
    }

    let result = aggregator.fetch(&name).await;
    if !alive.load(Ordering::SeqCst) {
        return;
    }

    let mut inner = inner.write().await;
    inner.loading = false;
    match result {
        Ok(detail) => inner.pokemon = Some(detail),
        Err(e) => {
            log::error!("detail aggregation for {name} failed: {e}");
            inner.error = Some(Arc::new(e));
        }
    }
}

//! Incremental list loader.
//!
//! Materializes a fixed-size universe of entities through paginated
//! fetches without blocking consumers on the full set. Each page's raw
//! summaries are enriched (full record plus per-type weakness set) with
//! the sub-fetches running concurrently and reassembled in request order,
//! so the merged list is stable by offset and within-page order.
//!
//! An independent background "load all" sweep fetches the whole universe
//! in one listing call; once it completes non-empty it supersedes the
//! paginated result entirely and the visible list switches over
//! transparently. The sweep races the incremental path by design - both
//! converge to the same content.
//!
//! Errors never cross the handle boundary as panics: a failed page
//! listing lands in the `error` snapshot field with previously loaded
//! pages intact, and retry is a caller-initiated action.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::api::error::{Error, Result};
use crate::api::models::{NamedResource, PokemonResponse};
use crate::api::PokeApiClient;

use super::model::{dedup_preserving_order, ListEntry, Pokemon};

/// Default page size.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 12;

/// First-generation universe size.
pub const DEFAULT_TOTAL: usize = 151;

/// Where the loader sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPhase {
    Idle,
    LoadingFirstPage,
    PartiallyLoaded,
    LoadingNextPage,
    FullyLoaded,
}

impl LoadPhase {
    /// True while a page request is in flight.
    pub fn is_loading(self) -> bool {
        matches!(self, LoadPhase::LoadingFirstPage | LoadPhase::LoadingNextPage)
    }
}

/// Pagination bounds for the loader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListConfig {
    pub items_per_page: usize,
    /// Known total count of the collection.
    pub total: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            total: DEFAULT_TOTAL,
        }
    }
}

/// Snapshot handed to consumers: the visible list plus loading flags.
#[derive(Debug, Clone)]
pub struct ListState {
    /// The visible entries - the background sweep's result when it has
    /// completed, the incrementally paginated list otherwise.
    pub entries: Vec<ListEntry>,
    pub loading: bool,
    pub loading_all: bool,
    pub error: Option<Arc<Error>>,
    pub has_more: bool,
    pub next_offset: usize,
    pub total: usize,
    pub phase: LoadPhase,
}

struct ListInner {
    phase: LoadPhase,
    entries: Vec<ListEntry>,
    all_entries: Vec<ListEntry>,
    next_offset: usize,
    has_more: bool,
    loading_all: bool,
    all_done: bool,
    error: Option<Arc<Error>>,
}

/// Paginated loader over the listing endpoint.
pub struct PokemonListLoader {
    client: Arc<PokeApiClient>,
    config: ListConfig,
    inner: Arc<RwLock<ListInner>>,
    /// Cleared on shutdown; completion handlers check it before touching
    /// shared state so a disposed consumer is never updated.
    alive: Arc<AtomicBool>,
}

impl PokemonListLoader {
    pub fn new(client: Arc<PokeApiClient>, config: ListConfig) -> Self {
        Self {
            client,
            config,
            inner: Arc::new(RwLock::new(ListInner {
                phase: LoadPhase::Idle,
                entries: Vec::new(),
                all_entries: Vec::new(),
                next_offset: 0,
                has_more: true,
                loading_all: false,
                all_done: false,
                error: None,
            })),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Current state. The sweep result, once non-empty, takes priority
    /// over the paginated one.
    pub async fn snapshot(&self) -> ListState {
        let inner = self.inner.read().await;
        let entries = if inner.all_done {
            inner.all_entries.clone()
        } else {
            inner.entries.clone()
        };
        ListState {
            entries,
            loading: inner.phase.is_loading(),
            loading_all: inner.loading_all,
            error: inner.error.clone(),
            has_more: inner.has_more,
            next_offset: inner.next_offset,
            total: self.config.total,
            phase: inner.phase,
        }
    }

    /// Stop applying state updates from in-flight work. Requests already
    /// on the wire are not aborted.
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Fetch and enrich the first page. Suppressed unless the loader is
    /// idle, so repeated calls cannot double-append.
    pub async fn load_first_page(&self) {
        {
            let mut inner = self.inner.write().await;
            if inner.phase != LoadPhase::Idle {
                return;
            }
            inner.phase = LoadPhase::LoadingFirstPage;
            inner.error = None;
        }

        let result = self.fetch_page(0).await;
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }

        let mut inner = self.inner.write().await;
        match result {
            Ok(entries) => {
                inner.entries = entries;
                inner.next_offset = self.config.items_per_page;
                inner.has_more = inner.next_offset < self.config.total;
                inner.phase = if inner.has_more {
                    LoadPhase::PartiallyLoaded
                } else {
                    LoadPhase::FullyLoaded
                };
            }
            Err(e) => {
                log::error!("initial page load failed: {e}");
                inner.error = Some(Arc::new(e));
                // Back to idle so a caller-initiated retry can run.
                inner.phase = LoadPhase::Idle;
            }
        }
    }

    /// Fetch and enrich the next page. Suppressed while another page
    /// request is in flight for the same cursor, and once the universe is
    /// exhausted. Previously loaded pages survive a failure untouched.
    pub async fn load_more(&self) {
        let offset = {
            let mut inner = self.inner.write().await;
            if inner.phase.is_loading()
                || !inner.has_more
                || inner.next_offset >= self.config.total
            {
                return;
            }
            inner.phase = LoadPhase::LoadingNextPage;
            inner.next_offset
        };

        let result = self.fetch_page(offset).await;
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }

        let mut inner = self.inner.write().await;
        match result {
            Ok(mut entries) => {
                // The cursor cannot have moved while we held the loading
                // phase, but a duplicate append would corrupt the list, so
                // re-check before merging.
                if inner.next_offset != offset {
                    log::warn!("dropping stale page result for offset {offset}");
                    inner.phase = LoadPhase::PartiallyLoaded;
                    return;
                }
                inner.entries.append(&mut entries);
                inner.next_offset = offset + self.config.items_per_page;
                inner.has_more = inner.next_offset < self.config.total;
                inner.phase = if inner.has_more {
                    LoadPhase::PartiallyLoaded
                } else {
                    LoadPhase::FullyLoaded
                };
            }
            Err(e) => {
                log::error!("page load at offset {offset} failed: {e}");
                inner.error = Some(Arc::new(e));
                inner.phase = LoadPhase::PartiallyLoaded;
            }
        }
    }

    /// Kick off the background full sweep. Suppressed when a sweep is
    /// already running or a previous one completed non-empty. The sweep's
    /// failure is logged and never disturbs the incremental path.
    pub async fn start_load_all(&self) -> Option<JoinHandle<()>> {
        {
            let mut inner = self.inner.write().await;
            if inner.loading_all || inner.all_done {
                return None;
            }
            inner.loading_all = true;
        }

        let client = self.client.clone();
        let config = self.config;
        let inner = self.inner.clone();
        let alive = self.alive.clone();

        Some(tokio::spawn(async move {
            let result = fetch_and_enrich(&client, config.total, 0).await;
            if !alive.load(Ordering::SeqCst) {
                return;
            }

            let mut inner = inner.write().await;
            inner.loading_all = false;
            match result {
                Ok(entries) => {
                    if !entries.is_empty() {
                        inner.all_done = true;
                        inner.all_entries = entries;
                    }
                }
                Err(e) => {
                    // The incremental path keeps serving as the fallback.
                    log::warn!("background full load failed: {e}");
                }
            }
        }))
    }

    async fn fetch_page(&self, offset: usize) -> Result<Vec<ListEntry>> {
        fetch_and_enrich(&self.client, self.config.items_per_page, offset).await
    }
}

async fn fetch_and_enrich(
    client: &PokeApiClient,
    limit: usize,
    offset: usize,
) -> Result<Vec<ListEntry>> {
    let page = client.list_pokemon(limit, offset).await?;
    Ok(enrich_summaries(client, page.results).await)
}

/// Resolve each summary into an enriched entry, preserving the page's
/// original order. When any secondary fetch fails the page degrades to
/// un-enriched entries rather than losing the listing.
async fn enrich_summaries(client: &PokeApiClient, summaries: Vec<NamedResource>) -> Vec<ListEntry> {
    let enriched = try_join_all(summaries.iter().map(|summary| async move {
        let raw: PokemonResponse = client.fetch_url(&summary.url).await?;
        let weaknesses = fetch_weakness_names(client, &raw).await?;
        Ok::<_, Error>(ListEntry {
            name: summary.name.clone(),
            url: summary.url.clone(),
            details: Some(Pokemon::from_response(raw, weaknesses)),
        })
    }))
    .await;

    match enriched {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("page enrichment failed, serving bare summaries: {e}");
            summaries
                .into_iter()
                .map(|s| ListEntry::summary(s.name, s.url))
                .collect()
        }
    }
}

/// Union the `double_damage_from` relations of all of a record's types,
/// de-duplicated by type name in first-seen order. One fetch per type;
/// the fetches run concurrently but are reassembled in type order.
pub(crate) async fn fetch_weakness_names(
    client: &PokeApiClient,
    raw: &PokemonResponse,
) -> Result<Vec<String>> {
    let per_type = try_join_all(raw.types.iter().map(|slot| async move {
        let type_data = client.type_by_url(&slot.type_ref.url).await?;
        Ok::<_, Error>(
            type_data
                .damage_relations
                .double_damage_from
                .into_iter()
                .map(|r| r.name)
                .collect::<Vec<_>>(),
        )
    }))
    .await?;

    Ok(dedup_preserving_order(per_type.into_iter().flatten()))
}

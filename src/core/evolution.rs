//! Evolution chain traversal.
//!
//! Resolves a species ID to its evolution chain and transforms the raw
//! nested `evolves_to` graph into an owned tree. The remote contract says
//! the graph is acyclic, but nothing enforces that, so the transform
//! carries a depth guard and refuses suspiciously deep input instead of
//! recursing forever.
//!
//! Transformed trees are cached in the durable tier under
//! `evolution_chain_<id>`, subject to the shared TTL-on-read contract.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::api::error::{Error, Result};
use crate::api::models::ChainLink;
use crate::api::PokeApiClient;

use super::model::{EvolutionNode, EvolutionTrigger};
use super::store::PersistentCache;

/// Longest chain the transform will follow. Real chains are three or
/// four nodes deep; anything past this is treated as malformed input.
pub const MAX_CHAIN_DEPTH: usize = 16;

/// Cache key prefix for persisted chains.
pub const CHAIN_KEY_PREFIX: &str = "evolution_chain_";

// ============================================================================
// EvolutionService
// ============================================================================

/// Fetches and transforms evolution chains, with durable caching.
pub struct EvolutionService {
    client: Arc<PokeApiClient>,
    cache: PersistentCache<EvolutionNode>,
}

impl EvolutionService {
    pub fn new(client: Arc<PokeApiClient>, cache: PersistentCache<EvolutionNode>) -> Self {
        Self { client, cache }
    }

    /// Resolve the evolution tree for a species ID. Served from the
    /// durable cache when a fresh entry exists.
    pub async fn chain(&self, pokemon_id: u32) -> Result<EvolutionNode> {
        let key = pokemon_id.to_string();
        if let Some(cached) = self.cache.get(&key) {
            log::debug!("evolution chain for {pokemon_id} served from cache");
            return Ok(cached);
        }

        let species = self.client.species(pokemon_id).await?;
        let chain = self
            .client
            .evolution_chain_by_url(&species.evolution_chain.url)
            .await?;

        let tree = transform_chain(&chain.chain)?;
        self.cache.put(&key, &tree);
        Ok(tree)
    }
}

/// Build the owned tree from the raw chain. Fails on over-deep input and
/// on species references whose URL carries no numeric ID.
pub(crate) fn transform_chain(root: &ChainLink) -> Result<EvolutionNode> {
    transform_node(root, None, 0)
}

fn transform_node(
    link: &ChainLink,
    trigger: Option<EvolutionTrigger>,
    depth: usize,
) -> Result<EvolutionNode> {
    if depth >= MAX_CHAIN_DEPTH {
        return Err(Error::invalid_data(format!(
            "evolution chain deeper than {MAX_CHAIN_DEPTH} nodes"
        )));
    }

    let evolves_to = link
        .evolves_to
        .iter()
        .map(|child| {
            // Only the first detail is kept; the API lists one per
            // trigger condition and the display cares about the primary.
            let trigger = child.evolution_details.first().map(|d| EvolutionTrigger {
                min_level: d.min_level,
                trigger: d.trigger.as_ref().map(|t| t.name.clone()),
                item: d.item.as_ref().map(|i| i.name.clone()),
            });
            transform_node(child, trigger, depth + 1)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EvolutionNode {
        id: link.species.trailing_id()?,
        name: link.species.name.clone(),
        trigger,
        evolves_to,
    })
}

// ============================================================================
// EvolutionLoader
// ============================================================================

/// Snapshot exposed to the evolution view.
#[derive(Debug, Clone)]
pub struct EvolutionState {
    pub chain: Option<EvolutionNode>,
    pub loading: bool,
    pub error: Option<Arc<Error>>,
}

struct EvolutionInner {
    chain: Option<EvolutionNode>,
    loading: bool,
    error: Option<Arc<Error>>,
}

/// Hook-shaped handle around [`EvolutionService`] with liveness-guarded
/// state writes.
pub struct EvolutionLoader {
    service: Arc<EvolutionService>,
    inner: Arc<RwLock<EvolutionInner>>,
    alive: Arc<AtomicBool>,
}

impl EvolutionLoader {
    pub fn new(service: Arc<EvolutionService>) -> Self {
        Self {
            service,
            inner: Arc::new(RwLock::new(EvolutionInner {
                chain: None,
                loading: false,
                error: None,
            })),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Resolve the chain for `pokemon_id`, updating the snapshot.
    pub async fn load(&self, pokemon_id: u32) {
        run_load(
            self.service.clone(),
            self.inner.clone(),
            self.alive.clone(),
            pokemon_id,
        )
        .await;
    }

    /// Spawn [`EvolutionLoader::load`] as a background task.
    pub fn spawn_load(&self, pokemon_id: u32) -> JoinHandle<()> {
        let service = self.service.clone();
        let inner = self.inner.clone();
        let alive = self.alive.clone();
        tokio::spawn(run_load(service, inner, alive, pokemon_id))
    }

    pub async fn snapshot(&self) -> EvolutionState {
        let inner = self.inner.read().await;
        EvolutionState {
            chain: inner.chain.clone(),
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
    service: Arc<EvolutionService>,
    inner: Arc<RwLock<EvolutionInner>>,
    alive: Arc<AtomicBool>,
    pokemon_id: u32,
) {
    {
        let mut inner = inner.write().await;
        inner.loading = true;
        inner.error = None;
    }

    let result = service.chain(pokemon_id).await;
    if !alive.load(Ordering::SeqCst) {
        return;
    }

    let mut inner = inner.write().await;
    inner.loading = false;
    match result {
        Ok(tree) => inner.chain = Some(tree),
        Err(e) => {
            log::error!("evolution chain fetch for {pokemon_id} failed: {e}");
            inner.error = Some(Arc::new(e));
        }
    }
}

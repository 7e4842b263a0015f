//! Evolution service and handle behavior against a mock API, including
//! the durable cache tier's TTL contract.

use std::sync::Arc;

use crate::core::cache::{Clock, ManualClock};
use crate::core::evolution::{EvolutionLoader, EvolutionService, CHAIN_KEY_PREFIX};
use crate::core::store::{MemoryStore, PersistentCache};
use crate::tests::common::{MockPokeApi, SpeciesSpec};

fn service(api: &MockPokeApi, ttl_ms: u64, clock: Arc<ManualClock>) -> EvolutionService {
    let cache = PersistentCache::new(
        Arc::new(MemoryStore::new()),
        CHAIN_KEY_PREFIX,
        ttl_ms,
        clock as Arc<dyn Clock>,
    );
    EvolutionService::new(api.client(), cache)
}

/// Mount species 1 plus the bulbasaur line as its chain.
async fn mount_bulbasaur_chain(api: &MockPokeApi) {
    api.mount_species(&SpeciesSpec::new(1, "bulbasaur")).await;
    let chain = api.chain_node(
        1,
        "bulbasaur",
        None,
        vec![api.chain_node(
            2,
            "ivysaur",
            Some(16),
            vec![api.chain_node(3, "venusaur", Some(32), vec![])],
        )],
    );
    api.mount_chain(1, chain).await;
}

#[tokio::test]
async fn test_chain_is_fetched_and_transformed() {
    let api = MockPokeApi::start().await;
    mount_bulbasaur_chain(&api).await;
    let service = service(&api, 1000, Arc::new(ManualClock::new()));

    let tree = service.chain(1).await.unwrap();
    assert_eq!(tree.id, 1);
    assert_eq!(tree.name, "bulbasaur");
    assert!(tree.trigger.is_none(), "the root has no inbound transition");

    let ivysaur = &tree.evolves_to[0];
    assert_eq!(ivysaur.id, 2);
    let trigger = ivysaur.trigger.as_ref().unwrap();
    assert_eq!(trigger.min_level, Some(16));
    assert_eq!(trigger.trigger.as_deref(), Some("level-up"));

    let venusaur = &ivysaur.evolves_to[0];
    assert_eq!(venusaur.name, "venusaur");
    assert!(venusaur.evolves_to.is_empty());
    assert_eq!(tree.node_count(), 3);
}

#[tokio::test]
async fn test_second_lookup_is_served_from_the_durable_tier() {
    let api = MockPokeApi::start().await;
    mount_bulbasaur_chain(&api).await;
    let service = service(&api, 60_000, Arc::new(ManualClock::new()));

    let first = service.chain(1).await.unwrap();
    let second = service.chain(1).await.unwrap();
    assert_eq!(first, second);

    // One species fetch plus one chain fetch; the repeat never hit the wire.
    let requests = api.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let api = MockPokeApi::start().await;
    mount_bulbasaur_chain(&api).await;
    let clock = Arc::new(ManualClock::new());
    let service = service(&api, 1000, clock.clone());

    service.chain(1).await.unwrap();
    clock.advance(1000);
    service.chain(1).await.unwrap();

    let requests = api.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4, "the stale entry forced a second fetch pair");
}

#[tokio::test]
async fn test_unknown_species_is_not_found() {
    let api = MockPokeApi::start().await;
    let service = service(&api, 1000, Arc::new(ManualClock::new()));
    assert!(service.chain(9999).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_loader_snapshot_carries_the_tree() {
    let api = MockPokeApi::start().await;
    mount_bulbasaur_chain(&api).await;
    let service = service(&api, 1000, Arc::new(ManualClock::new()));
    let loader = EvolutionLoader::new(Arc::new(service));

    loader.load(1).await;

    let state = loader.snapshot().await;
    let tree = state.chain.expect("chain landed");
    assert_eq!(tree.name, "bulbasaur");
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_loader_shutdown_suppresses_the_result() {
    let api = MockPokeApi::start().await;
    mount_bulbasaur_chain(&api).await;
    let service = service(&api, 1000, Arc::new(ManualClock::new()));
    let loader = EvolutionLoader::new(Arc::new(service));

    loader.shutdown();
    loader.load(1).await;

    let state = loader.snapshot().await;
    assert!(state.chain.is_none());
    assert!(state.error.is_none());
}

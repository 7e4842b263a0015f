use std::sync::Arc;
use std::time::Duration;

use kantodex::api::PokeApiClient;
use kantodex::config::AppConfig;
use kantodex::core::cache::{CacheConfig, SystemClock, TtlCache};
use kantodex::core::detail::{CachedPokemonFetcher, DetailAggregator};
use kantodex::core::evolution::{EvolutionService, CHAIN_KEY_PREFIX};
use kantodex::core::list::{ListConfig, PokemonListLoader};
use kantodex::core::store::{FileStore, PersistentCache};

#[tokio::main]
async fn main() {
    let _log_guard = kantodex::core::logging::init();
    log::info!("kantodex v{} starting", kantodex::VERSION);

    let config = AppConfig::load();
    if let Err(e) = run(&config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(config: &AppConfig) -> kantodex::api::Result<()> {
    let client = Arc::new(
        PokeApiClient::builder()
            .base_url(&config.api.base_url)
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?,
    );

    match std::env::args().nth(1) {
        Some(name) => show_detail(config, client, &name.to_lowercase()).await,
        None => show_first_page(config, client).await,
    }
}

/// Print the aggregated detail record and evolution chain for one entity.
async fn show_detail(
    config: &AppConfig,
    client: Arc<PokeApiClient>,
    name: &str,
) -> kantodex::api::Result<()> {
    let cache = Arc::new(TtlCache::new(
        CacheConfig::default()
            .ttl_ms(config.cache.ttl_ms())
            .capacity(config.cache.capacity),
        Arc::new(SystemClock),
    ));
    let fetcher = Arc::new(CachedPokemonFetcher::new(client.clone(), cache));
    let aggregator = DetailAggregator::new(client.clone(), fetcher).locale(&config.api.locale);

    let detail = aggregator.fetch(name).await?;

    println!(
        "#{:03} {} - {}",
        detail.pokemon.id, detail.pokemon.name, detail.category
    );
    println!("  {}", detail.description);
    println!("  Types: {}", detail.pokemon.types.join(", "));
    println!(
        "  Weak against: {}",
        detail
            .weaknesses
            .iter()
            .map(|w| format!("{} (x{})", w.type_name, w.multiplier))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  Height: {:.1} m  Weight: {:.1} kg",
        detail.pokemon.height_m(),
        detail.pokemon.weight_kg()
    );
    println!("  Abilities: {}", detail.pokemon.abilities.join(", "));
    println!("  Gender: {}", detail.gender.display());
    for stat in &detail.pokemon.stats {
        println!("  {:>16}: {:>3}", stat.name, stat.value);
    }

    let store = Arc::new(FileStore::new(config.data_dir().join("cache")));
    let chain_cache = PersistentCache::new(
        store,
        CHAIN_KEY_PREFIX,
        config.cache.ttl_ms(),
        Arc::new(SystemClock),
    );
    let evolution = EvolutionService::new(client, chain_cache);

    match evolution.chain(detail.pokemon.id).await {
        Ok(tree) => {
            println!("  Evolution chain:");
            print_chain(&tree, 4);
        }
        Err(e) => log::warn!("could not resolve evolution chain: {e}"),
    }

    Ok(())
}

fn print_chain(node: &kantodex::core::model::EvolutionNode, indent: usize) {
    let trigger = node
        .trigger
        .as_ref()
        .map(|t| {
            let mut parts = Vec::new();
            if let Some(level) = t.min_level {
                parts.push(format!("level {level}"));
            }
            if let Some(item) = &t.item {
                parts.push(item.clone());
            }
            if parts.is_empty() {
                t.trigger.clone().unwrap_or_default()
            } else {
                parts.join(", ")
            }
        })
        .map(|t| format!(" ({t})"))
        .unwrap_or_default();

    println!("{:indent$}#{:03} {}{trigger}", "", node.id, node.name);
    for child in &node.evolves_to {
        print_chain(child, indent + 2);
    }
}

/// Load and print the first page of the list.
async fn show_first_page(config: &AppConfig, client: Arc<PokeApiClient>) -> kantodex::api::Result<()> {
    let loader = PokemonListLoader::new(
        client,
        ListConfig {
            items_per_page: config.api.items_per_page,
            total: config.api.total,
        },
    );

    loader.load_first_page().await;
    let state = loader.snapshot().await;

    if let Some(e) = &state.error {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    for entry in &state.entries {
        match &entry.details {
            Some(p) => println!("#{:03} {:<12} [{}]", p.id, p.name, p.types.join(", ")),
            None => println!("     {:<12} (not enriched)", entry.name),
        }
    }
    println!(
        "{} of {} loaded; more available: {}",
        state.entries.len(),
        state.total,
        state.has_more
    );

    Ok(())
}

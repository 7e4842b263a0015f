//! Shared wiremock fixtures shaped like the remote API's responses.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::PokeApiClient;

/// A mock remote data source plus a client pointed at it.
pub struct MockPokeApi {
    pub server: MockServer,
}

impl MockPokeApi {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn client(&self) -> Arc<PokeApiClient> {
        Arc::new(PokeApiClient::with_base_url(self.server.uri()).expect("client builds"))
    }

    /// Mount one page of the listing endpoint. Summary URLs point back
    /// at this mock server.
    pub async fn mount_listing(&self, limit: usize, offset: usize, count: usize, names: &[(u32, &str)]) {
        let results: Vec<Value> = names
            .iter()
            .map(|(id, name)| {
                json!({"name": name, "url": format!("{}/pokemon/{id}", self.server.uri())})
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/pokemon"))
            .and(query_param("limit", limit.to_string()))
            .and(query_param("offset", offset.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"count": count, "results": results})),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a pokemon record under both its ID and name paths.
    pub async fn mount_pokemon(&self, spec: &PokemonSpec<'_>) {
        let body = self.pokemon_body(spec);
        for segment in [spec.id.to_string(), spec.name.to_string()] {
            Mock::given(method("GET"))
                .and(path(format!("/pokemon/{segment}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
                .mount(&self.server)
                .await;
        }
    }

    pub fn pokemon_body(&self, spec: &PokemonSpec<'_>) -> Value {
        let uri = self.server.uri();
        let types: Vec<Value> = spec
            .types
            .iter()
            .enumerate()
            .map(|(i, t)| {
                json!({"slot": i + 1, "type": {"name": t, "url": format!("{uri}/type/{t}")}})
            })
            .collect();
        let abilities: Vec<Value> = spec
            .abilities
            .iter()
            .enumerate()
            .map(|(i, a)| {
                json!({"ability": {"name": a, "url": format!("{uri}/ability/{a}")},
                       "is_hidden": false, "slot": i + 1})
            })
            .collect();

        json!({
            "id": spec.id,
            "name": spec.name,
            "height": spec.height,
            "weight": spec.weight,
            "types": types,
            "abilities": abilities,
            "stats": [
                {"base_stat": 45, "stat": {"name": "hp", "url": format!("{uri}/stat/1")}},
                {"base_stat": 49, "stat": {"name": "attack", "url": format!("{uri}/stat/2")}}
            ],
            "sprites": {"front_default": format!("{uri}/sprites/{}.png", spec.id), "other": null},
            "species": {"name": spec.name, "url": format!("{uri}/pokemon-species/{}", spec.id)}
        })
    }

    /// Mount a type record exposing its `double_damage_from` relations.
    pub async fn mount_type(&self, name: &str, double_damage_from: &[&str]) {
        let uri = self.server.uri();
        let from: Vec<Value> = double_damage_from
            .iter()
            .map(|t| json!({"name": t, "url": format!("{uri}/type/{t}")}))
            .collect();

        Mock::given(method("GET"))
            .and(path(format!("/type/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": name,
                "damage_relations": {"double_damage_from": from}
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount species metadata. `flavor_locale` controls which language the
    /// single flavor/genus entry carries.
    pub async fn mount_species(&self, spec: &SpeciesSpec<'_>) {
        let uri = self.server.uri();
        let body = json!({
            "id": spec.id,
            "name": spec.name,
            "flavor_text_entries": [
                {"flavor_text": spec.flavor_text,
                 "language": {"name": spec.flavor_locale, "url": format!("{uri}/language/1")}}
            ],
            "genera": [
                {"genus": spec.genus,
                 "language": {"name": spec.flavor_locale, "url": format!("{uri}/language/1")}}
            ],
            "egg_groups": [
                {"name": "monster", "url": format!("{uri}/egg-group/1")},
                {"name": "plant", "url": format!("{uri}/egg-group/7")}
            ],
            "hatch_counter": 20,
            "gender_rate": spec.gender_rate,
            "capture_rate": 45,
            "base_happiness": 50,
            "habitat": {"name": "grassland", "url": format!("{uri}/pokemon-habitat/3")},
            "growth_rate": {"name": "medium-slow", "url": format!("{uri}/growth-rate/4")},
            "generation": {"name": "generation-i", "url": format!("{uri}/generation/1")},
            "evolution_chain": {"url": format!("{uri}/evolution-chain/{}", spec.chain_id)}
        });

        Mock::given(method("GET"))
            .and(path(format!("/pokemon-species/{}", spec.id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mount the version listing.
    pub async fn mount_versions(&self, names: &[&str]) {
        let uri = self.server.uri();
        let results: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(i, n)| json!({"name": n, "url": format!("{uri}/version/{}", i + 1)}))
            .collect();

        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"count": names.len(), "results": results})),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount an evolution chain record with the given raw chain body.
    pub async fn mount_chain(&self, chain_id: u32, chain: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/evolution-chain/{chain_id}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": chain_id, "chain": chain})),
            )
            .mount(&self.server)
            .await;
    }

    /// A raw chain node for [`MockPokeApi::mount_chain`] bodies.
    pub fn chain_node(&self, id: u32, name: &str, min_level: Option<u32>, evolves_to: Vec<Value>) -> Value {
        let details = match min_level {
            Some(level) => json!([{
                "min_level": level,
                "trigger": {"name": "level-up", "url": format!("{}/evolution-trigger/1", self.server.uri())},
                "item": null
            }]),
            None => json!([]),
        };
        json!({
            "species": {"name": name, "url": format!("{}/pokemon-species/{id}/", self.server.uri())},
            "evolution_details": details,
            "evolves_to": evolves_to
        })
    }
}

/// Inputs for a mounted pokemon record.
pub struct PokemonSpec<'a> {
    pub id: u32,
    pub name: &'a str,
    pub types: &'a [&'a str],
    pub abilities: &'a [&'a str],
    pub height: u32,
    pub weight: u32,
}

impl<'a> PokemonSpec<'a> {
    pub fn new(id: u32, name: &'a str, types: &'a [&'a str]) -> Self {
        Self {
            id,
            name,
            types,
            abilities: &["overgrow"],
            height: 7,
            weight: 69,
        }
    }
}

/// Inputs for a mounted species record.
pub struct SpeciesSpec<'a> {
    pub id: u32,
    pub name: &'a str,
    pub flavor_text: &'a str,
    pub genus: &'a str,
    pub flavor_locale: &'a str,
    pub gender_rate: i8,
    pub chain_id: u32,
}

impl<'a> SpeciesSpec<'a> {
    pub fn new(id: u32, name: &'a str) -> Self {
        Self {
            id,
            name,
            flavor_text: "A strange seed was\nplanted on its back at birth.",
            genus: "Seed Pokémon",
            flavor_locale: "en",
            gender_rate: 1,
            chain_id: id,
        }
    }
}

//! Wire models for the PokéAPI contract.
//!
//! These structs mirror the subset of the remote API consumed by the data
//! core: the paged listing endpoint, the pokemon record, type damage
//! relations, species metadata, the evolution chain graph, and the version
//! listing. Unknown fields are ignored on decode.

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// A `{name, url}` reference to another API resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

impl NamedResource {
    /// Parse the numeric ID from the trailing path segment of the
    /// resource URL (`.../pokemon-species/25/` -> 25).
    pub fn trailing_id(&self) -> Result<u32> {
        trailing_id(&self.url)
    }
}

/// A bare `{url}` reference (used for evolution chains on species records).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub url: String,
}

/// Parse the numeric ID from the trailing path segment of an API URL.
pub fn trailing_id(url: &str) -> Result<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|seg| seg.parse().ok())
        .ok_or_else(|| Error::invalid_data(format!("no numeric ID in resource URL: {url}")))
}

/// One page of the listing endpoint: `{count, results}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PagedResponse {
    /// Total number of entries in the collection.
    pub count: u32,
    pub results: Vec<NamedResource>,
}

/// A full pokemon record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonResponse {
    pub id: u32,
    pub name: String,
    /// Height in decimeters (API-native unit).
    pub height: u32,
    /// Weight in hectograms (API-native unit).
    pub weight: u32,
    pub types: Vec<TypeSlot>,
    pub abilities: Vec<AbilitySlot>,
    pub stats: Vec<StatSlot>,
    #[serde(default)]
    pub sprites: Sprites,
    pub species: NamedResource,
}

/// One entry of a pokemon's ordered type list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub type_ref: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    #[serde(default)]
    pub is_hidden: bool,
    pub slot: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatSlot {
    /// Base value, 0-255.
    pub base_stat: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: Option<ArtworkSprites>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtworkSprites {
    pub front_default: Option<String>,
}

impl Sprites {
    /// Best display image: official artwork, falling back to the default
    /// front sprite.
    pub fn display_url(&self) -> Option<String> {
        self.other
            .as_ref()
            .and_then(|o| o.official_artwork.as_ref())
            .and_then(|a| a.front_default.clone())
            .or_else(|| self.front_default.clone())
    }
}

/// A type record; only the damage relations are consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeResponse {
    pub name: String,
    pub damage_relations: DamageRelations,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DamageRelations {
    #[serde(default)]
    pub double_damage_from: Vec<NamedResource>,
}

/// Species metadata keyed by the same ID as the pokemon record.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesResponse {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
    #[serde(default)]
    pub genera: Vec<GenusEntry>,
    #[serde(default)]
    pub egg_groups: Vec<NamedResource>,
    pub hatch_counter: Option<u32>,
    /// Female chance in eighths; -1 means genderless.
    pub gender_rate: i8,
    /// 0-255.
    pub capture_rate: u32,
    /// 0-255.
    pub base_happiness: Option<u32>,
    pub habitat: Option<NamedResource>,
    pub growth_rate: Option<NamedResource>,
    pub generation: Option<NamedResource>,
    pub evolution_chain: ResourceRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlavorTextEntry {
    pub flavor_text: String,
    pub language: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenusEntry {
    pub genus: String,
    pub language: NamedResource,
}

impl SpeciesResponse {
    /// Locale-filtered descriptive text, with form-feed and newline
    /// artifacts collapsed to spaces. `None` when no entry matches.
    pub fn description(&self, locale: &str) -> Option<String> {
        self.flavor_text_entries
            .iter()
            .find(|e| e.language.name == locale)
            .map(|e| {
                e.flavor_text
                    .chars()
                    .map(|c| if c == '\n' || c == '\u{c}' { ' ' } else { c })
                    .collect()
            })
    }

    /// Locale-filtered genus ("Seed Pokémon" and the like).
    pub fn genus(&self, locale: &str) -> Option<String> {
        self.genera
            .iter()
            .find(|g| g.language.name == locale)
            .map(|g| g.genus.clone())
    }
}

/// An evolution chain record: a rooted tree of species transitions.
#[derive(Debug, Clone, Deserialize)]
pub struct EvolutionChainResponse {
    pub id: u32,
    pub chain: ChainLink,
}

/// One node of the raw evolution tree. Branches are allowed.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolution_details: Vec<EvolutionDetailEntry>,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvolutionDetailEntry {
    pub min_level: Option<u32>,
    pub trigger: Option<NamedResource>,
    pub item: Option<NamedResource>,
}

//! Domain records derived from the wire models.
//!
//! The remote API's raw shapes stay in `api::models`; this module holds
//! the flattened records the loader, filter engine, and aggregator work
//! with, plus the derived classifications (weakness sets, height/weight
//! buckets, gender ratio).

use serde::{Deserialize, Serialize};

use crate::api::models::{PokemonResponse, SpeciesResponse};

/// Damage multiplier carried by every derived weakness entry.
pub const WEAKNESS_MULTIPLIER: f32 = 2.0;

// ============================================================================
// List records
// ============================================================================

/// One named base statistic (0-255).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub value: u32,
}

/// An enriched entity record: the full pokemon plus its derived
/// weakness-type set. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    /// Ordered type tags.
    pub types: Vec<String>,
    /// De-duplicated union of `double_damage_from` across the types,
    /// first-seen order.
    pub weaknesses: Vec<String>,
    /// Height in decimeters.
    pub height: u32,
    /// Weight in hectograms.
    pub weight: u32,
    /// Ordered ability names (canonical lowercase).
    pub abilities: Vec<String>,
    pub sprite: Option<String>,
    pub stats: Vec<Stat>,
}

impl Pokemon {
    /// Build the enriched record from a raw response and the weakness-type
    /// names already resolved for its types.
    pub fn from_response(raw: PokemonResponse, weaknesses: Vec<String>) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            types: raw.types.into_iter().map(|t| t.type_ref.name).collect(),
            weaknesses,
            height: raw.height,
            weight: raw.weight,
            abilities: raw.abilities.into_iter().map(|a| a.ability.name).collect(),
            sprite: raw.sprites.display_url(),
            stats: raw
                .stats
                .into_iter()
                .map(|s| Stat {
                    name: s.stat.name,
                    value: s.base_stat,
                })
                .collect(),
        }
    }

    /// Height converted from decimeters to meters.
    pub fn height_m(&self) -> f64 {
        self.height as f64 / 10.0
    }

    /// Weight converted from hectograms to kilograms.
    pub fn weight_kg(&self) -> f64 {
        self.weight as f64 / 10.0
    }
}

/// One entry of the loaded list.
///
/// A single tagged record covers both generations of list shape: the bare
/// summary from the listing endpoint, and the same entry once the
/// secondary fetches have filled in `details`. Entries that failed to
/// enrich keep `details = None` and are excluded by the filter engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub name: String,
    pub url: String,
    pub details: Option<Pokemon>,
}

impl ListEntry {
    /// A bare, un-enriched entry.
    pub fn summary(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            details: None,
        }
    }
}

/// Union two weakness-name lists, de-duplicating by name while preserving
/// first-seen order.
pub fn dedup_preserving_order(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

// ============================================================================
// Buckets
// ============================================================================

/// Height classification, partitioned at 0.5 m and 1.5 m. Lower bounds
/// are open, upper bounds closed; the top bucket is unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightClass {
    Small,
    Medium,
    Large,
}

impl HeightClass {
    /// Classify a height given in decimeters.
    pub fn classify(height_dm: u32) -> Self {
        let meters = height_dm as f64 / 10.0;
        if meters <= 0.5 {
            HeightClass::Small
        } else if meters <= 1.5 {
            HeightClass::Medium
        } else {
            HeightClass::Large
        }
    }
}

/// Weight classification, partitioned at 10 kg and 50 kg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightClass {
    Light,
    Medium,
    Heavy,
}

impl WeightClass {
    /// Classify a weight given in hectograms.
    pub fn classify(weight_hg: u32) -> Self {
        let kg = weight_hg as f64 / 10.0;
        if kg <= 10.0 {
            WeightClass::Light
        } else if kg <= 50.0 {
            WeightClass::Medium
        } else {
            WeightClass::Heavy
        }
    }
}

// ============================================================================
// Detail records
// ============================================================================

/// A derived (type name, damage multiplier) pair. No duplicate type names
/// appear in one entity's weakness set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weakness {
    #[serde(rename = "type")]
    pub type_name: String,
    pub multiplier: f32,
}

/// Gender distribution of a species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GenderRatio {
    Genderless,
    Ratio {
        /// Female share in [0, 1].
        female: f32,
    },
}

impl GenderRatio {
    /// Convert the API's eighths encoding (-1 means genderless).
    pub fn from_rate(rate: i8) -> Self {
        if rate < 0 {
            GenderRatio::Genderless
        } else {
            GenderRatio::Ratio {
                female: rate as f32 / 8.0,
            }
        }
    }

    pub fn is_genderless(&self) -> bool {
        matches!(self, GenderRatio::Genderless)
    }

    /// Human-readable split, e.g. `12.5% ♀ / 87.5% ♂`.
    pub fn display(&self) -> String {
        match self {
            GenderRatio::Genderless => "Genderless".to_string(),
            GenderRatio::Ratio { female } => format!(
                "{:.1}% ♀ / {:.1}% ♂",
                female * 100.0,
                (1.0 - female) * 100.0
            ),
        }
    }
}

/// A game version reference kept on the detail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    pub name: String,
    pub url: String,
}

/// The display-ready aggregate for one entity: entity record, derived
/// weaknesses, locale-filtered species text, and breeding/habitat/growth
/// metadata merged into a single immutable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonDetail {
    pub pokemon: Pokemon,
    pub weaknesses: Vec<Weakness>,
    pub description: String,
    pub category: String,
    pub egg_groups: Vec<String>,
    pub hatch_counter: Option<u32>,
    pub gender: GenderRatio,
    pub capture_rate: u32,
    pub base_happiness: Option<u32>,
    pub habitat: Option<String>,
    pub growth_rate: Option<String>,
    pub generation: Option<String>,
    pub versions: Vec<VersionRef>,
}

/// Fallback description when no locale entry matches.
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// Fallback category when no locale genus matches.
pub const DEFAULT_CATEGORY: &str = "Unknown";

impl PokemonDetail {
    /// Merge species metadata into the aggregate fields.
    pub(crate) fn species_fields(species: &SpeciesResponse, locale: &str) -> SpeciesFields {
        SpeciesFields {
            description: species
                .description(locale)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            category: species
                .genus(locale)
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            egg_groups: species.egg_groups.iter().map(|g| g.name.clone()).collect(),
            hatch_counter: species.hatch_counter,
            gender: GenderRatio::from_rate(species.gender_rate),
            capture_rate: species.capture_rate,
            base_happiness: species.base_happiness,
            habitat: species.habitat.as_ref().map(|h| h.name.clone()),
            growth_rate: species.growth_rate.as_ref().map(|g| g.name.clone()),
            generation: species.generation.as_ref().map(|g| g.name.clone()),
        }
    }
}

/// Species-derived slice of [`PokemonDetail`], split out so the
/// aggregator can assemble the record in stages.
pub(crate) struct SpeciesFields {
    pub description: String,
    pub category: String,
    pub egg_groups: Vec<String>,
    pub hatch_counter: Option<u32>,
    pub gender: GenderRatio,
    pub capture_rate: u32,
    pub base_happiness: Option<u32>,
    pub habitat: Option<String>,
    pub growth_rate: Option<String>,
    pub generation: Option<String>,
}

// ============================================================================
// Evolution tree
// ============================================================================

/// The trigger that caused a transition from a node's parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionTrigger {
    pub min_level: Option<u32>,
    pub trigger: Option<String>,
    pub item: Option<String>,
}

/// One node of the owned evolution tree. The root carries no trigger;
/// every other node records what caused its transition. Children own
/// their subtrees - there are no back references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionNode {
    pub id: u32,
    pub name: String,
    pub trigger: Option<EvolutionTrigger>,
    pub evolves_to: Vec<EvolutionNode>,
}

impl EvolutionNode {
    /// Number of nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self
            .evolves_to
            .iter()
            .map(EvolutionNode::node_count)
            .sum::<usize>()
    }
}

//! Derived filter engine.
//!
//! A pure transform from the loaded list plus a filter specification to
//! the visible subset. The source list is never mutated; the spec is an
//! immutable snapshot value replaced wholesale on every user edit, which
//! keeps recomputation predictable.
//!
//! Predicates are evaluated per entity in a fixed order, short-circuiting
//! on the first failure (logical AND). An empty or absent field is always
//! a pass-through.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::model::{HeightClass, ListEntry, WeightClass};

// ============================================================================
// FilterSpec
// ============================================================================

/// Per-type toggle pair: match on own type, match on weakness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeToggle {
    pub is_type: bool,
    pub is_weakness: bool,
}

/// Inclusive numeric ID range; an absent bound imposes no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl NumberRange {
    fn contains(&self, id: u32) -> bool {
        self.min.map_or(true, |min| id >= min) && self.max.map_or(true, |max| id <= max)
    }
}

/// Snapshot of every active filter facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Free text: an integer matches the ID exactly, anything else is a
    /// case-insensitive name substring.
    pub search: String,
    /// Ordered per-type toggles.
    pub types: IndexMap<String, TypeToggle>,
    /// Exact match against the entity's ability list.
    pub ability: Option<String>,
    pub height: Option<HeightClass>,
    pub weight: Option<WeightClass>,
    pub number_range: NumberRange,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the search text.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    /// Builder method to toggle a type facet.
    pub fn toggle_type(mut self, type_name: impl Into<String>, is_type: bool) -> Self {
        self.types.entry(type_name.into()).or_default().is_type = is_type;
        self
    }

    /// Builder method to toggle a weakness facet.
    pub fn toggle_weakness(mut self, type_name: impl Into<String>, is_weakness: bool) -> Self {
        self.types.entry(type_name.into()).or_default().is_weakness = is_weakness;
        self
    }

    /// Builder method to set the ability facet.
    pub fn ability(mut self, ability: impl Into<String>) -> Self {
        self.ability = Some(ability.into());
        self
    }

    /// Builder method to set the height bucket.
    pub fn height(mut self, height: HeightClass) -> Self {
        self.height = Some(height);
        self
    }

    /// Builder method to set the weight bucket.
    pub fn weight(mut self, weight: WeightClass) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Builder method to set the ID range.
    pub fn number_range(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.number_range = NumberRange { min, max };
        self
    }

    /// True when every facet is empty, i.e. the filter is the identity.
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && !self.any_type_toggle()
            && !self.any_weakness_toggle()
            && self.ability.as_deref().map_or(true, str::is_empty)
            && self.height.is_none()
            && self.weight.is_none()
            && self.number_range.min.is_none()
            && self.number_range.max.is_none()
    }

    fn any_type_toggle(&self) -> bool {
        self.types.values().any(|t| t.is_type)
    }

    fn any_weakness_toggle(&self) -> bool {
        self.types.values().any(|t| t.is_weakness)
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Apply the spec to the full list, returning the visible subset in the
/// original order.
pub fn apply(entries: &[ListEntry], spec: &FilterSpec) -> Vec<ListEntry> {
    entries
        .iter()
        .filter(|e| matches(e, spec))
        .cloned()
        .collect()
}

/// Evaluate one entry against the spec, in the documented predicate order.
pub fn matches(entry: &ListEntry, spec: &FilterSpec) -> bool {
    // 1. Entries that failed to enrich are never visible.
    let Some(pokemon) = entry.details.as_ref() else {
        return false;
    };

    // 2. Search text: numeric input means exact ID match, anything else a
    //    case-insensitive name substring.
    let search = spec.search.trim();
    if !search.is_empty() {
        match search.parse::<u32>() {
            Ok(id) => {
                if pokemon.id != id {
                    return false;
                }
            }
            Err(_) => {
                if !pokemon
                    .name
                    .to_lowercase()
                    .contains(&search.to_lowercase())
                {
                    return false;
                }
            }
        }
    }

    // 3. Type membership: OR across active type toggles.
    if spec.any_type_toggle() {
        let matched = spec
            .types
            .iter()
            .any(|(name, t)| t.is_type && pokemon.types.iter().any(|own| own == name));
        if !matched {
            return false;
        }
    }

    // 4. Weakness membership, symmetric to (3).
    if spec.any_weakness_toggle() {
        let matched = spec
            .types
            .iter()
            .any(|(name, t)| t.is_weakness && pokemon.weaknesses.iter().any(|w| w == name));
        if !matched {
            return false;
        }
    }

    // 5. Ability: exact, case-sensitive match on the canonical name.
    if let Some(ability) = spec.ability.as_deref() {
        if !ability.is_empty() && !pokemon.abilities.iter().any(|a| a == ability) {
            return false;
        }
    }

    // 6. Height bucket.
    if let Some(height) = spec.height {
        if HeightClass::classify(pokemon.height) != height {
            return false;
        }
    }

    // 7. Weight bucket.
    if let Some(weight) = spec.weight {
        if WeightClass::classify(pokemon.weight) != weight {
            return false;
        }
    }

    // 8. Inclusive ID range.
    spec.number_range.contains(pokemon.id)
}

// ============================================================================
// SearchDebouncer
// ============================================================================

/// Generation-counted debounce for search edits.
///
/// Every edit calls [`SearchDebouncer::settle`]; only the call belonging
/// to the latest edit survives the delay, so filter recomputation runs
/// once per burst of keystrokes.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait out the debounce window. Returns `true` iff no newer edit
    /// arrived while waiting.
    pub async fn settle(&self) -> bool {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == my_generation
    }
}

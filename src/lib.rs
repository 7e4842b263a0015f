//! kantodex - Pokédex data core.
//!
//! Client-side caching, incremental list loading, derived filtering,
//! and detail aggregation over the PokéAPI REST service. Presentation
//! is left to consumers of the snapshot-style state handles.

pub mod api;
pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

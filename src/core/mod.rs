//! Core data layer: caching tiers, the incremental list loader, the
//! derived filter engine, detail aggregation, and evolution chains.

pub mod cache;
pub mod detail;
pub mod evolution;
pub mod filter;
pub mod list;
pub mod logging;
pub mod model;
pub mod store;

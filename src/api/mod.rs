//! Remote data source integration: wire models, HTTP client, and the
//! crate-wide error taxonomy.

pub mod client;
pub mod error;
pub mod models;

pub use client::PokeApiClient;
pub use error::{Error, Result};

//! WHO ICD-11 API client.
//!
//! Wraps the ICD API (entity resolution and MMS linearization search) behind
//! OAuth2 client-credentials authentication. Access tokens, resolved entities,
//! and search results are all cached so terminology traffic does not hammer
//! the WHO endpoints.
//!
//! The client is optional at runtime: with `enabled = false` every call
//! returns [`IcdError::Disabled`] and callers degrade to local-only results.

mod client;
mod config;
mod error;

pub use client::{IcdClient, SearchHit, entity_definition, entity_title};
pub use config::IcdConfig;
pub use error::IcdError;
